//! SQL composition for a data-param group.
//!
//! Two shapes only. Comma mode: `FROM t1 a1, t2 a2` with every join
//! condition folded into WHERE. Join mode: `FROM t1 a1 LEFT JOIN t2 a2 ON
//! (...)`, where the first table's own condition still goes to WHERE.

use super::group::DataParamGroup;
use crate::spec::{Projection, SpecSet};
use crate::sql::{Query, SelectExpr, TableRef};

/// Column alias of the count variant.
pub const COUNT_COLUMN: &str = "_count";

/// A composed query and the aliases that contributed columns to it.
#[derive(Debug, Clone)]
pub struct Composition {
    pub query: Query,
    pub aliases: Vec<String>,
}

/// Build the query for `group`. `None` when no alias in the group has a
/// non-empty projection.
pub fn compose(group: &DataParamGroup, specs: &SpecSet, count_only: bool) -> Option<Composition> {
    let parts: Vec<(&str, Projection)> = group
        .key_aliases
        .iter()
        .filter_map(|alias| {
            let spec = specs.get(alias)?;
            let projection = spec.projection();
            if projection.is_empty() {
                tracing::trace!(alias = %alias, "alias has no projection, left out of query");
                None
            } else {
                Some((spec.key_alias(), projection))
            }
        })
        .collect();

    if parts.is_empty() {
        return None;
    }

    let select = if count_only {
        vec![SelectExpr::count_star().with_alias(COUNT_COLUMN)]
    } else {
        parts
            .iter()
            .flat_map(|(_, projection)| projection.select_exprs())
            .collect()
    };

    let mut query = Query::new().select(select);
    if let Some(condition) = group.where_all_condition() {
        query = query.filter(condition);
    }

    for (i, (alias, projection)) in parts.iter().enumerate() {
        let Some(spec) = specs.get(alias) else {
            continue;
        };
        if let Some(condition) = group.where_for_alias(alias) {
            query = query.filter(condition);
        }

        let table = TableRef::new(spec.table()).with_alias(spec.table_alias());
        let on = group.on_condition(alias, specs).map(str::to_string);
        query = if i == 0 {
            let query = query.from(table);
            match on {
                Some(on) => query.filter(format!("({})", on)),
                None => query,
            }
        } else {
            attach(query, table, on, group.is_join)
        };

        for join in &projection.joins {
            let table = TableRef::new(&join.table).with_alias(&join.table_alias);
            let on = join.on.clone().filter(|s| !s.is_empty());
            query = attach(query, table, on, group.is_join);
        }
    }

    if !count_only {
        if let Some(order_by) = group.order_by.as_deref().filter(|s| !s.is_empty()) {
            query = query.order_by(order_by);
        }
        // "0" means no limit
        let limit = group.limit.as_deref().map(str::trim);
        if let Some(limit) = limit.filter(|s| !s.is_empty() && *s != "0") {
            query = query.limit(limit);
        }
    }

    Some(Composition {
        query,
        aliases: parts.into_iter().map(|(a, _)| a.to_string()).collect(),
    })
}

fn attach(query: Query, table: TableRef, on: Option<String>, is_join: bool) -> Query {
    if is_join {
        query.left_join(table, on)
    } else {
        let query = query.comma_join(table);
        match on {
            Some(on) => query.filter(format!("({})", on)),
            None => query,
        }
    }
}
