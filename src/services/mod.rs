// ============================================================================
// SERVICES - MODULE PRINCIPAL
// ============================================================================
//
// Logique métier, une struct sans état par domaine. Les routes ne font
// qu'extraire la requête et déléguer ici.
//
// Liste des modules:
//   - auth_service : Login par portail, mot de passe (changement, oubli, reset)
//   - email_service : Envoi SES ou log, gabarits des emails
//   - s3_service : URL pré-signées et suppression d'objets
//   - document_service : Contrôle d'accès aux documents
//   - engineer_service : Recherche publique et page d'accueil
//   - contact_service : Formulaire public, contacts du client
//   - contact_detail_service : Détail d'un contact côté client (logs, commentaires, approbation)
//   - proposal_list_service : Liste des propositions côté client
//   - contract_service : Contrats MSA/SOW
//   - dashboard_service : Tableaux de bord client, sales et admin
//   - sales_contact_service : Contacts côté sales
//   - opportunity_service : Pipeline commercial
//   - sales_proposal_service : Versions, revue et pièces jointes des propositions
//   - sales_contract_service : Création, modification et revue des MSA/SOW
//   - admin_user_service / admin_engineer_service / admin_master_data_service : Back-office admin
//
// ============================================================================

pub mod auth_service;
pub mod email_service;
pub mod s3_service;
pub mod document_service;
pub mod engineer_service;
pub mod contact_service;
pub mod contact_detail_service;
pub mod proposal_list_service;
pub mod contract_service;
pub mod dashboard_service;
pub mod sales_contact_service;
pub mod opportunity_service;
pub mod sales_proposal_service;
pub mod sales_contract_service;
pub mod admin_user_service;
pub mod admin_engineer_service;
pub mod admin_master_data_service;
