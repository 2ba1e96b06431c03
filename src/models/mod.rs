// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Description:
//   Point d'entrée pour tous les modèles de données.
//   Chaque modèle correspond à une table PostgreSQL avec SeaORM.
//
// Liste des modules:
//   - health : Health check API
//   - dto : Data Transfer Objects pour les requêtes/réponses API
//   - users : Utilisateurs (clients, sales, admin)
//   - password_reset_tokens : Tokens de reset password (expire 1h)
//   - contacts : Demandes entrantes des clients
//   - contact_status_history : Historique des changements de statut
//   - communication_logs : Journal des échanges sur un contact
//   - proposal_comments : Commentaires client sur une proposition
//   - consultation_cancellations : Annulations de consultation
//   - opportunities : Pipeline commercial (OP-YYYY-NN)
//   - proposals : Propositions versionnées
//   - proposal_history : Journal des actions sur les propositions
//   - document_metadata : Contrôle d'accès des objets S3
//   - contract_status : Statut commun MSA/SOW
//   - msa_contracts / sow_contracts : Contrats
//   - change_requests : Demandes de changement sur contrat
//   - engineers / engineer_skills / certificates : Catalogue ingénieurs
//   - skills / project_types : Données de référence (admin)
//
// Points d'attention:
//   - Tous les modèles utilisent SeaORM (pas de SQL brut)
//   - Le schéma est géré en dehors de ce service (pas de migrations ici)
//   - Les relations entre tables sont définies dans chaque modèle
//
// ============================================================================

pub mod health;
pub mod dto;
pub mod users;
pub mod password_reset_tokens;
pub mod contacts;
pub mod contact_status_history;
pub mod communication_logs;
pub mod proposal_comments;
pub mod consultation_cancellations;
pub mod opportunities;
pub mod proposals;
pub mod proposal_history;
pub mod document_metadata;
pub mod contract_status;
pub mod msa_contracts;
pub mod sow_contracts;
pub mod change_requests;
pub mod engineers;
pub mod engineer_skills;
pub mod certificates;
pub mod skills;
pub mod project_types;
