//pour les requêtes et réponses structurées de chaque portail
pub mod common;
pub mod auth;
pub mod contact;
pub mod proposal;
pub mod opportunity;
pub mod contract;
pub mod dashboard;
pub mod engineer;
pub mod admin;
pub mod document;
