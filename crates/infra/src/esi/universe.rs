//! Universe reference endpoints (public, no token)

use auspex_domain::UniverseType;
use serde::Deserialize;

use super::client::EsiHttpClient;
use super::errors::{EsiError, EsiResult};

#[derive(Debug, Deserialize)]
struct EsiType {
    type_id: i64,
    name: String,
    group_id: i64,
}

#[derive(Debug, Deserialize)]
struct EsiGroup {
    group_id: i64,
    name: String,
    category_id: i64,
}

#[derive(Debug, Deserialize)]
struct EsiCategory {
    category_id: i64,
    name: String,
}

impl EsiHttpClient {
    /// Resolve a type through `/universe/types`, `/universe/groups` and
    /// `/universe/categories`, in that order.
    ///
    /// # Errors
    /// `EsiError::Universe` naming the step that failed.
    pub async fn resolve_universe_type(&self, type_id: i64) -> EsiResult<UniverseType> {
        let eve_type: EsiType =
            self.public_get(&format!("/universe/types/{type_id}"), "type", type_id).await?;
        let group: EsiGroup = self
            .public_get(&format!("/universe/groups/{}", eve_type.group_id), "group", eve_type.group_id)
            .await?;
        let category: EsiCategory = self
            .public_get(
                &format!("/universe/categories/{}", group.category_id),
                "category",
                group.category_id,
            )
            .await?;

        Ok(UniverseType {
            type_id: eve_type.type_id,
            type_name: eve_type.name,
            group_id: group.group_id,
            group_name: group.name,
            category_id: category.category_id,
            category_name: category.name,
        })
    }

    async fn public_get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        step: &'static str,
        id: i64,
    ) -> EsiResult<T> {
        self.get_json::<T>(&self.url(path), None)
            .await
            .map(|(value, _)| value)
            .map_err(|source| EsiError::Universe { step, id, source: Box::new(source) })
    }
}
