// Correspondance entre statuts stockés en base et libellés des portails.

use std::fmt;
use std::str::FromStr;

/// Statut d'une proposition (texte en base)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalStatus {
    Draft,
    InternalReview,
    SentToClient,
    RevisionRequested,
    Approved,
    Rejected,
    ConvertedToContract,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Draft => "draft",
            ProposalStatus::InternalReview => "internal_review",
            ProposalStatus::SentToClient => "sent_to_client",
            ProposalStatus::RevisionRequested => "revision_requested",
            ProposalStatus::Approved => "approved",
            ProposalStatus::Rejected => "rejected",
            ProposalStatus::ConvertedToContract => "converted_to_contract",
        }
    }

    /// Statuts qu'un client a le droit de voir
    pub fn client_visible() -> [&'static str; 3] {
        [
            ProposalStatus::SentToClient.as_str(),
            ProposalStatus::RevisionRequested.as_str(),
            ProposalStatus::Approved.as_str(),
        ]
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProposalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ProposalStatus::Draft),
            "internal_review" => Ok(ProposalStatus::InternalReview),
            "sent_to_client" => Ok(ProposalStatus::SentToClient),
            "revision_requested" => Ok(ProposalStatus::RevisionRequested),
            "approved" => Ok(ProposalStatus::Approved),
            "rejected" => Ok(ProposalStatus::Rejected),
            "converted_to_contract" => Ok(ProposalStatus::ConvertedToContract),
            other => Err(format!("Unknown proposal status: {}", other)),
        }
    }
}

/// Filtre du portail client -> statut en base (None = pas de filtre)
pub fn client_filter_to_proposal_status(filter: Option<&str>) -> Option<String> {
    let filter = filter.map(str::trim).filter(|f| !f.is_empty())?;
    match filter {
        "All" => None,
        "Under review" => Some(ProposalStatus::SentToClient.as_str().to_string()),
        "Request for change" => Some(ProposalStatus::RevisionRequested.as_str().to_string()),
        "Approved" => Some(ProposalStatus::Approved.as_str().to_string()),
        other => Some(other.to_string()),
    }
}

/// Statut en base -> libellé de la liste des propositions du client
pub fn proposal_status_to_client_label(status: &str) -> &'static str {
    match status {
        "revision_requested" => "Request for change",
        "approved" => "Approved",
        _ => "Under review",
    }
}

/// Statut en base -> libellé dans le détail d'un contact client
pub fn proposal_status_to_contact_label(status: &str) -> &'static str {
    match status {
        "revision_requested" => "Request for Change",
        "approved" => "Approved",
        _ => "Pending",
    }
}

/// Statut d'une opportunité
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpportunityStatus {
    New,
    ProposalDrafting,
    ProposalSent,
    ClientUnderReview,
    Revision,
    Won,
    Lost,
}

impl OpportunityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpportunityStatus::New => "NEW",
            OpportunityStatus::ProposalDrafting => "PROPOSAL_DRAFTING",
            OpportunityStatus::ProposalSent => "PROPOSAL_SENT",
            OpportunityStatus::ClientUnderReview => "CLIENT_UNDER_REVIEW",
            OpportunityStatus::Revision => "REVISION",
            OpportunityStatus::Won => "WON",
            OpportunityStatus::Lost => "LOST",
        }
    }

    /// Statut déduit de la proposition courante
    pub fn from_current_proposal(proposal_status: Option<&str>) -> Self {
        match proposal_status {
            Some("sent_to_client") => OpportunityStatus::ClientUnderReview,
            Some("revision_requested") => OpportunityStatus::Revision,
            Some("draft") | Some("internal_review") => OpportunityStatus::ProposalDrafting,
            Some("approved") => OpportunityStatus::Won,
            _ => OpportunityStatus::New,
        }
    }
}

impl fmt::Display for OpportunityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Étape du pipeline affichée (New / Proposal / Won / Lost)
pub fn opportunity_stage(status: &str) -> &'static str {
    match status {
        "PROPOSAL_DRAFTING" | "PROPOSAL_SENT" | "REVISION" | "CLIENT_UNDER_REVIEW" => "Proposal",
        "WON" => "Won",
        "LOST" => "Lost",
        _ => "New",
    }
}

/// Statut de contact en base -> code affiché côté sales
pub fn contact_status_to_code(status: &str) -> String {
    match status {
        "New" => "NEW".to_string(),
        "Inprogress" => "INPROGRESS".to_string(),
        "Completed" => "COMPLETED".to_string(),
        "Closed" => "CLOSED".to_string(),
        "Converted to Opportunity" => "CONVERTED_TO_OPPORTUNITY".to_string(),
        other => other.to_uppercase().replace(' ', "_"),
    }
}

/// Code sales -> statut de contact en base
pub fn contact_code_to_status(code: &str) -> String {
    match code.to_uppercase().as_str() {
        "NEW" => "New".to_string(),
        "INPROGRESS" => "Inprogress".to_string(),
        "COMPLETED" => "Completed".to_string(),
        "CLOSED" => "Closed".to_string(),
        "CONVERTED_TO_OPPORTUNITY" => "Converted to Opportunity".to_string(),
        _ => code.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_filter_mapping() {
        assert_eq!(client_filter_to_proposal_status(Some("Under review")).as_deref(), Some("sent_to_client"));
        assert_eq!(client_filter_to_proposal_status(Some("Request for change")).as_deref(), Some("revision_requested"));
        assert_eq!(client_filter_to_proposal_status(Some("Approved")).as_deref(), Some("approved"));
        assert_eq!(client_filter_to_proposal_status(Some("All")), None);
        assert_eq!(client_filter_to_proposal_status(Some("  ")), None);
        assert_eq!(client_filter_to_proposal_status(None), None);
    }

    #[test]
    fn test_client_labels() {
        assert_eq!(proposal_status_to_client_label("sent_to_client"), "Under review");
        assert_eq!(proposal_status_to_client_label("revision_requested"), "Request for change");
        assert_eq!(proposal_status_to_client_label("approved"), "Approved");
        assert_eq!(proposal_status_to_client_label("draft"), "Under review");

        assert_eq!(proposal_status_to_contact_label("revision_requested"), "Request for Change");
        assert_eq!(proposal_status_to_contact_label("sent_to_client"), "Pending");
    }

    #[test]
    fn test_opportunity_status_from_proposal() {
        assert_eq!(OpportunityStatus::from_current_proposal(Some("sent_to_client")), OpportunityStatus::ClientUnderReview);
        assert_eq!(OpportunityStatus::from_current_proposal(Some("internal_review")), OpportunityStatus::ProposalDrafting);
        assert_eq!(OpportunityStatus::from_current_proposal(Some("approved")), OpportunityStatus::Won);
        assert_eq!(OpportunityStatus::from_current_proposal(Some("rejected")), OpportunityStatus::New);
        assert_eq!(OpportunityStatus::from_current_proposal(None), OpportunityStatus::New);
    }

    #[test]
    fn test_stage() {
        assert_eq!(opportunity_stage("NEW"), "New");
        assert_eq!(opportunity_stage("REVISION"), "Proposal");
        assert_eq!(opportunity_stage("WON"), "Won");
        assert_eq!(opportunity_stage("LOST"), "Lost");
    }

    #[test]
    fn test_contact_status_codes() {
        assert_eq!(contact_status_to_code("Converted to Opportunity"), "CONVERTED_TO_OPPORTUNITY");
        assert_eq!(contact_status_to_code("On hold"), "ON_HOLD");
        assert_eq!(contact_code_to_status("inprogress"), "Inprogress");
        assert_eq!(contact_code_to_status("Other"), "Other");
    }

    #[test]
    fn test_proposal_status_parse() {
        assert_eq!("internal_review".parse::<ProposalStatus>(), Ok(ProposalStatus::InternalReview));
        assert!("sent".parse::<ProposalStatus>().is_err());
    }
}
