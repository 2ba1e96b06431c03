// Aides pour construire les filtres SeaORM

use sea_orm::sea_query::{Expr, Func, IntoColumnRef, SimpleExpr};

/// LOWER(col) LIKE '%needle%'
pub fn ci_contains<C: IntoColumnRef>(column: C, needle: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).like(format!("%{}%", needle.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::contacts;
    use sea_orm::sea_query::{PostgresQueryBuilder, Query};

    #[test]
    fn test_ci_contains_sql() {
        let sql = Query::select()
            .column(contacts::Column::Id)
            .from(contacts::Entity)
            .and_where(ci_contains((contacts::Entity, contacts::Column::Title), "Java"))
            .to_string(PostgresQueryBuilder);

        assert!(sql.contains(r#"LOWER("contacts"."title") LIKE '%java%'"#), "{}", sql);
    }
}
