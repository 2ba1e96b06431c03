// ============================================================================
// SERVICE : DONNÉES DE RÉFÉRENCE (admin)
// ============================================================================
//
// Compétences:
//   - une compétence "parent" (parent_skill_id NULL) regroupe des sous-compétences
//   - nom unique parmi les parents, unique par parent pour les sous-compétences
//   - suppression refusée (409) si une compétence est utilisée par un ingénieur
//   - supprimer un parent supprime ses sous-compétences
//
// Types de projet: CRUD simple, nom unique.
//
// ============================================================================

use sea_orm::*;

use crate::error::{AppError, AppResult};
use crate::models::dto::admin::{
    MasterDataQuery, ProjectTypeDto, ProjectTypeListResponse, ProjectTypeRequest, SkillDto,
    SkillListResponse, SkillRequest, SubSkillRequest,
};
use crate::models::dto::common::{clean_search, PageInfo, Paging};
use crate::models::{engineer_skills, project_types, skills};
use crate::utils::query::ci_contains;
use crate::utils::validation::validate_request;

pub struct AdminMasterDataService;

impl AdminMasterDataService {
    // ---- Compétences ----

    /// Compétences parents paginées, avec leurs sous-compétences
    pub async fn list_skills(db: &DatabaseConnection, query: &MasterDataQuery) -> AppResult<SkillListResponse> {
        let paging = Paging::new(query.page, query.size);
        let mut select = skills::Entity::find().filter(skills::Column::ParentSkillId.is_null());
        if let Some(search) = clean_search(query.search.as_deref()) {
            select = select.filter(ci_contains((skills::Entity, skills::Column::Name), &search));
        }

        let paginator = select.order_by_asc(skills::Column::Name).paginate(db, paging.size);
        let totals = paginator.num_items_and_pages().await?;
        let parents = paginator.fetch_page(paging.page).await?;

        // 1. Sous-compétences de la page en une requête
        let ids: Vec<i32> = parents.iter().map(|p| p.id).collect();
        let children = if ids.is_empty() {
            Vec::new()
        } else {
            skills::Entity::find()
                .filter(skills::Column::ParentSkillId.is_in(ids))
                .order_by_asc(skills::Column::Name)
                .all(db)
                .await?
        };

        // 2. Regroupement
        let content = parents
            .into_iter()
            .map(|parent| {
                let id = parent.id;
                let mut dto = SkillDto::from(parent);
                dto.sub_skills = children
                    .iter()
                    .filter(|c| c.parent_skill_id == Some(id))
                    .cloned()
                    .map(SkillDto::from)
                    .collect();
                dto
            })
            .collect();

        Ok(SkillListResponse {
            content,
            page: PageInfo {
                total_elements: totals.number_of_items,
                total_pages: totals.number_of_pages,
                number: paging.page,
                size: paging.size,
            },
        })
    }

    pub async fn list_sub_skills(db: &DatabaseConnection, parent_id: i32) -> AppResult<Vec<SkillDto>> {
        find_parent(db, parent_id).await?;
        let children = skills::Entity::find()
            .filter(skills::Column::ParentSkillId.eq(parent_id))
            .order_by_asc(skills::Column::Name)
            .all(db)
            .await?;
        Ok(children.into_iter().map(SkillDto::from).collect())
    }

    /// Crée une compétence parent et ses éventuelles sous-compétences
    pub async fn create_skill(db: &DatabaseConnection, request: SkillRequest) -> AppResult<SkillDto> {
        validate_request(&request)?;
        let name = request.name.trim().to_string();
        let sub_names = sub_skill_names(&request.sub_skills)?;

        if parent_named(db, &name).await?.is_some() {
            return Err(AppError::Conflict(format!("Skill name already exists: {}", name)));
        }

        let txn = db.begin().await?;
        let parent = skills::ActiveModel {
            name: Set(name),
            description: Set(request.description),
            parent_skill_id: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut dto = SkillDto::from(parent.clone());
        for sub_name in sub_names {
            let child = skills::ActiveModel {
                name: Set(sub_name),
                parent_skill_id: Set(Some(parent.id)),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            dto.sub_skills.push(child.into());
        }
        txn.commit().await?;

        tracing::info!(skill_id = dto.id, "Skill created");
        Ok(dto)
    }

    pub async fn create_sub_skill(db: &DatabaseConnection, parent_id: i32, request: SubSkillRequest) -> AppResult<SkillDto> {
        validate_request(&request)?;
        find_parent(db, parent_id).await?;
        let name = request.name.trim().to_string();

        if child_named(db, parent_id, &name).await?.is_some() {
            return Err(AppError::Conflict(format!("Sub-skill name already exists for this parent: {}", name)));
        }

        let child = skills::ActiveModel {
            name: Set(name),
            parent_skill_id: Set(Some(parent_id)),
            ..Default::default()
        }
        .insert(db)
        .await?;
        Ok(child.into())
    }

    /// Renomme une compétence parent (les sous-compétences passent par leur propre route)
    pub async fn update_skill(db: &DatabaseConnection, id: i32, request: SkillRequest) -> AppResult<SkillDto> {
        validate_request(&request)?;
        let skill = find_parent(db, id).await?;
        let name = request.name.trim().to_string();

        if let Some(other) = parent_named(db, &name).await? {
            if other.id != id {
                return Err(AppError::Conflict(format!("Skill name already exists: {}", name)));
            }
        }

        let mut active: skills::ActiveModel = skill.into();
        active.name = Set(name);
        active.description = Set(request.description);
        Ok(active.update(db).await?.into())
    }

    pub async fn update_sub_skill(db: &DatabaseConnection, id: i32, request: SubSkillRequest) -> AppResult<SkillDto> {
        validate_request(&request)?;
        let child = find_skill(db, id, "Sub-skill not found").await?;
        let Some(parent_id) = child.parent_skill_id else {
            return Err(AppError::bad_request(
                "Cannot update a parent skill using this endpoint. Use update skill endpoint.",
            ));
        };
        let name = request.name.trim().to_string();

        if let Some(other) = child_named(db, parent_id, &name).await? {
            if other.id != id {
                return Err(AppError::Conflict(format!("Sub-skill name already exists for this parent: {}", name)));
            }
        }

        let mut active: skills::ActiveModel = child.into();
        active.name = Set(name);
        Ok(active.update(db).await?.into())
    }

    /// Supprime un parent et ses sous-compétences si aucune n'est utilisée
    pub async fn delete_skill(db: &DatabaseConnection, id: i32) -> AppResult<()> {
        find_parent(db, id).await?;
        let children: Vec<i32> = skills::Entity::find()
            .select_only()
            .column(skills::Column::Id)
            .filter(skills::Column::ParentSkillId.eq(id))
            .into_tuple()
            .all(db)
            .await?;

        let mut all = children.clone();
        all.push(id);
        if in_use(db, &all).await? {
            return Err(AppError::Conflict(
                "Cannot delete skill. It or one of its sub-skills is currently in use by engineers.".to_string(),
            ));
        }

        let txn = db.begin().await?;
        if !children.is_empty() {
            skills::Entity::delete_many()
                .filter(skills::Column::Id.is_in(children))
                .exec(&txn)
                .await?;
        }
        skills::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!(skill_id = id, "Skill deleted");
        Ok(())
    }

    pub async fn delete_sub_skill(db: &DatabaseConnection, id: i32) -> AppResult<()> {
        let child = find_skill(db, id, "Sub-skill not found").await?;
        if child.parent_skill_id.is_none() {
            return Err(AppError::bad_request(
                "Cannot delete a parent skill using this endpoint. Use delete skill endpoint.",
            ));
        }
        if in_use(db, &[id]).await? {
            return Err(AppError::Conflict(
                "Cannot delete sub-skill. It is currently in use by engineers.".to_string(),
            ));
        }

        skills::Entity::delete_by_id(id).exec(db).await?;
        Ok(())
    }

    // ---- Types de projet ----

    pub async fn list_project_types(db: &DatabaseConnection, query: &MasterDataQuery) -> AppResult<ProjectTypeListResponse> {
        let paging = Paging::new(query.page, query.size);
        let mut select = project_types::Entity::find();
        if let Some(search) = clean_search(query.search.as_deref()) {
            select = select.filter(
                Condition::any()
                    .add(ci_contains((project_types::Entity, project_types::Column::Name), &search))
                    .add(ci_contains((project_types::Entity, project_types::Column::Description), &search)),
            );
        }

        let paginator = select.order_by_asc(project_types::Column::Name).paginate(db, paging.size);
        let totals = paginator.num_items_and_pages().await?;
        let rows = paginator.fetch_page(paging.page).await?;

        Ok(ProjectTypeListResponse {
            content: rows.into_iter().map(ProjectTypeDto::from).collect(),
            page: PageInfo {
                total_elements: totals.number_of_items,
                total_pages: totals.number_of_pages,
                number: paging.page,
                size: paging.size,
            },
        })
    }

    pub async fn create_project_type(db: &DatabaseConnection, request: ProjectTypeRequest) -> AppResult<ProjectTypeDto> {
        validate_request(&request)?;
        let name = request.name.trim().to_string();
        if project_type_named(db, &name).await?.is_some() {
            return Err(AppError::Conflict(format!("Project type name already exists: {}", name)));
        }

        let created = project_types::ActiveModel {
            name: Set(name),
            description: Set(request.description),
            ..Default::default()
        }
        .insert(db)
        .await?;
        tracing::info!(project_type_id = created.id, "Project type created");
        Ok(created.into())
    }

    pub async fn update_project_type(db: &DatabaseConnection, id: i32, request: ProjectTypeRequest) -> AppResult<ProjectTypeDto> {
        validate_request(&request)?;
        let project_type = find_project_type(db, id).await?;
        let name = request.name.trim().to_string();

        if let Some(other) = project_type_named(db, &name).await? {
            if other.id != id {
                return Err(AppError::Conflict(format!("Project type name already exists: {}", name)));
            }
        }

        let mut active: project_types::ActiveModel = project_type.into();
        active.name = Set(name);
        active.description = Set(request.description);
        Ok(active.update(db).await?.into())
    }

    pub async fn delete_project_type(db: &DatabaseConnection, id: i32) -> AppResult<()> {
        find_project_type(db, id).await?;
        project_types::Entity::delete_by_id(id).exec(db).await?;
        tracing::info!(project_type_id = id, "Project type deleted");
        Ok(())
    }
}

async fn find_skill(db: &DatabaseConnection, id: i32, missing: &str) -> AppResult<skills::Model> {
    skills::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found(missing))
}

async fn find_parent(db: &DatabaseConnection, id: i32) -> AppResult<skills::Model> {
    let skill = find_skill(db, id, "Skill not found").await?;
    if skill.parent_skill_id.is_some() {
        return Err(AppError::bad_request("Specified skill is not a parent skill"));
    }
    Ok(skill)
}

async fn parent_named(db: &DatabaseConnection, name: &str) -> Result<Option<skills::Model>, DbErr> {
    skills::Entity::find()
        .filter(skills::Column::ParentSkillId.is_null())
        .filter(skills::Column::Name.eq(name))
        .one(db)
        .await
}

async fn child_named(db: &DatabaseConnection, parent_id: i32, name: &str) -> Result<Option<skills::Model>, DbErr> {
    skills::Entity::find()
        .filter(skills::Column::ParentSkillId.eq(parent_id))
        .filter(skills::Column::Name.eq(name))
        .one(db)
        .await
}

async fn in_use(db: &DatabaseConnection, skill_ids: &[i32]) -> Result<bool, DbErr> {
    let count = engineer_skills::Entity::find()
        .filter(engineer_skills::Column::SkillId.is_in(skill_ids.iter().copied()))
        .count(db)
        .await?;
    Ok(count > 0)
}

async fn find_project_type(db: &DatabaseConnection, id: i32) -> AppResult<project_types::Model> {
    project_types::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("Project type not found"))
}

async fn project_type_named(db: &DatabaseConnection, name: &str) -> Result<Option<project_types::Model>, DbErr> {
    project_types::Entity::find()
        .filter(project_types::Column::Name.eq(name))
        .one(db)
        .await
}

/// Noms de sous-compétences nettoyés, sans doublon
fn sub_skill_names(requests: &[SubSkillRequest]) -> AppResult<Vec<String>> {
    let mut names: Vec<String> = Vec::new();
    for request in requests {
        validate_request(request)?;
        let name = request.name.trim().to_string();
        if names.contains(&name) {
            return Err(AppError::Conflict(format!("Sub-skill name already exists for this parent: {}", name)));
        }
        names.push(name);
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn skill(id: i32, name: &str, parent: Option<i32>) -> skills::Model {
        skills::Model {
            id,
            name: name.to_string(),
            parent_skill_id: parent,
            description: None,
        }
    }

    fn sub(name: &str) -> SubSkillRequest {
        SubSkillRequest { name: name.to_string() }
    }

    #[test]
    fn test_sub_skill_names() {
        let names = sub_skill_names(&[sub(" React "), sub("Vue")]).unwrap();
        assert_eq!(names, vec!["React", "Vue"]);
        assert!(matches!(sub_skill_names(&[sub("React"), sub("React ")]), Err(AppError::Conflict(_))));
        assert!(matches!(sub_skill_names(&[sub("")]), Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_duplicate_parent_name_is_conflict() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![skill(1, "Java", None)]])
            .into_connection();
        let request = SkillRequest {
            name: "Java".to_string(),
            description: None,
            sub_skills: Vec::new(),
        };

        let err = AdminMasterDataService::create_skill(&db, request).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(msg) if msg == "Skill name already exists: Java"));
    }

    #[tokio::test]
    async fn test_sub_skill_is_not_a_parent() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![skill(5, "Spring", Some(1))]])
            .into_connection();

        let err = AdminMasterDataService::list_sub_skills(&db, 5).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "Specified skill is not a parent skill"));
    }

    #[tokio::test]
    async fn test_skill_in_use_cannot_be_deleted() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![skill(1, "Java", None)]])
            .append_query_results([vec![BTreeMap::from([("id", Value::Int(Some(5)))])]])
            .append_query_results([vec![BTreeMap::from([("num_items", Value::BigInt(Some(2)))])]])
            .into_connection();

        let err = AdminMasterDataService::delete_skill(&db, 1).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_project_type_rename_to_existing_name() {
        let existing = project_types::Model {
            id: 2,
            name: "Web".to_string(),
            description: None,
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![project_types::Model {
                id: 3,
                name: "Mobile".to_string(),
                description: None,
            }]])
            .append_query_results([vec![existing]])
            .into_connection();
        let request = ProjectTypeRequest {
            name: "Web".to_string(),
            description: None,
        };

        let err = AdminMasterDataService::update_project_type(&db, 3, request).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(msg) if msg == "Project type name already exists: Web"));
    }
}
