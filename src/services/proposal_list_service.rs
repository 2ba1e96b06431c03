// Liste des propositions du portail client.
// Seules les propositions envoyées au client sont visibles
// (sent_to_client, revision_requested, approved).

use chrono::{Datelike, NaiveDate};
use sea_orm::*;

use crate::error::AppResult;
use crate::models::dto::common::{clean_search, Paging};
use crate::models::dto::proposal::{ClientProposalListItem, ClientProposalListQuery, ClientProposalListResponse};
use crate::models::{contacts, proposals};
use crate::utils::format::format_date;
use crate::utils::identifiers::{contact_display_id, missing_contact_display_id, proposal_display_id};
use crate::utils::query::ci_contains;
use crate::utils::status::{client_filter_to_proposal_status, proposal_status_to_client_label, ProposalStatus};

pub struct ProposalListService;

impl ProposalListService {
    /// En cas d'erreur, la liste est vide (le portail affiche "aucune proposition")
    pub async fn list_for_client(
        db: &DatabaseConnection,
        client_user_id: i32,
        query: &ClientProposalListQuery,
    ) -> ClientProposalListResponse {
        let paging = Paging::new(query.page, query.size);
        match Self::try_list(db, client_user_id, query, paging).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(client_user_id, error = %e, "Failed to load client proposals");
                ClientProposalListResponse::empty(paging.page, paging.size)
            }
        }
    }

    async fn try_list(
        db: &DatabaseConnection,
        client_user_id: i32,
        query: &ClientProposalListQuery,
        paging: Paging,
    ) -> AppResult<ClientProposalListResponse> {
        // 1. Propositions des contacts du client, statuts visibles
        let mut select = proposals::Entity::find()
            .find_also_related(contacts::Entity)
            .filter(contacts::Column::ClientUserId.eq(client_user_id))
            .filter(proposals::Column::Status.is_in(ProposalStatus::client_visible()));

        if let Some(status) = client_filter_to_proposal_status(query.status.as_deref()) {
            select = select.filter(proposals::Column::Status.eq(status));
        }
        if let Some(search) = clean_search(query.search.as_deref()) {
            select = select.filter(
                Condition::any()
                    .add(ci_contains((proposals::Entity, proposals::Column::Title), &search))
                    .add(ci_contains((contacts::Entity, contacts::Column::Description), &search))
                    .add(ci_contains((contacts::Entity, contacts::Column::Title), &search)),
            );
        }

        // 2. Pagination
        let paginator = select
            .order_by_desc(proposals::Column::CreatedAt)
            .order_by_desc(proposals::Column::Id)
            .paginate(db, paging.size);
        let totals = paginator.num_items_and_pages().await?;
        let rows = paginator.fetch_page(paging.page).await?;

        // 3. Identifiants lisibles
        let mut items = Vec::with_capacity(rows.len());
        for (i, (proposal, contact)) in rows.into_iter().enumerate() {
            let sequence = yearly_sequence(db, &proposal).await?;
            let contact_id = match (&contact, proposal.contact_id) {
                (Some(c), _) => contact_display_id(Some(c.id), c.client_user_id, c.created_at),
                (None, Some(id)) => missing_contact_display_id(id),
                (None, None) => "-".to_string(),
            };

            items.push(ClientProposalListItem {
                no: paging.row_number(i),
                internal_id: proposal.id,
                proposal_id: proposal_display_id(Some(proposal.id), proposal.created_at, sequence),
                contact_id,
                contact_description: contact.and_then(|c| c.description),
                status: proposal_status_to_client_label(&proposal.status).to_string(),
                date: format_date(proposal.created_at),
                title: proposal.title,
                link: proposal.link,
            });
        }

        Ok(ClientProposalListResponse {
            proposals: items,
            page: paging.page,
            page_size: paging.size,
            total_pages: totals.number_of_pages,
            total: totals.number_of_items,
        })
    }
}

/// Rang de la proposition dans son année de création (id <= celui-ci)
async fn yearly_sequence(db: &DatabaseConnection, proposal: &proposals::Model) -> Result<u64, DbErr> {
    let Some(created_at) = proposal.created_at else {
        return Ok(0);
    };
    let year = created_at.year();
    let (Some(start), Some(end)) = (NaiveDate::from_ymd_opt(year, 1, 1), NaiveDate::from_ymd_opt(year + 1, 1, 1))
    else {
        return Ok(0);
    };

    proposals::Entity::find()
        .filter(proposals::Column::CreatedAt.gte(start.and_time(Default::default())))
        .filter(proposals::Column::CreatedAt.lt(end.and_time(Default::default())))
        .filter(proposals::Column::Id.lte(proposal.id))
        .count(db)
        .await
}
