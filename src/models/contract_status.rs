use sea_orm::entity::prelude::*;
use sea_orm::Iterable;
use serde::{Deserialize, Serialize};

/// Statut commun aux contrats MSA et SOW, stocké en texte
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum ContractStatus {
    #[sea_orm(string_value = "Draft")]
    Draft,
    #[sea_orm(string_value = "Active")]
    Active,
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Under_Review")]
    UnderReview,
    #[sea_orm(string_value = "Request_for_Change")]
    RequestForChange,
    #[sea_orm(string_value = "Completed")]
    Completed,
    #[sea_orm(string_value = "Terminated")]
    Terminated,
}

impl ContractStatus {
    /// Libellé affiché ("Under_Review" -> "Under Review")
    pub fn label(&self) -> &'static str {
        match self {
            ContractStatus::Draft => "Draft",
            ContractStatus::Active => "Active",
            ContractStatus::Pending => "Pending",
            ContractStatus::UnderReview => "Under Review",
            ContractStatus::RequestForChange => "Request for Change",
            ContractStatus::Completed => "Completed",
            ContractStatus::Terminated => "Terminated",
        }
    }

    /// Statuts visibles dans la liste des contrats du portail client
    pub fn client_visible() -> [ContractStatus; 6] {
        [
            ContractStatus::Active,
            ContractStatus::Pending,
            ContractStatus::UnderReview,
            ContractStatus::RequestForChange,
            ContractStatus::Completed,
            ContractStatus::Terminated,
        ]
    }

    /// Parse un libellé de filtre ("Under Review" ou "Under_Review")
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label.trim().replace('_', " ");
        ContractStatus::iter().find(|s| s.label().eq_ignore_ascii_case(&normalized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_round_trip_with_underscores() {
        assert_eq!(ContractStatus::from_label("Under Review"), Some(ContractStatus::UnderReview));
        assert_eq!(ContractStatus::from_label("Request_for_Change"), Some(ContractStatus::RequestForChange));
        assert_eq!(ContractStatus::from_label("active"), Some(ContractStatus::Active));
        assert_eq!(ContractStatus::from_label("Archived"), None);
    }

    #[test]
    fn test_draft_is_not_client_visible() {
        assert!(!ContractStatus::client_visible().contains(&ContractStatus::Draft));
    }
}
