//! Blueprint endpoints

use auspex_domain::{Blueprint, Fetched};
use serde::Deserialize;

use super::client::EsiHttpClient;
use super::errors::EsiResult;

/// ESI marks originals with `quantity == -1`; copies use -2 or a stack size
const ORIGINAL_QUANTITY: i64 = -1;

#[derive(Debug, Deserialize)]
struct EsiBlueprint {
    item_id: i64,
    type_id: i64,
    location_id: i64,
    material_efficiency: i64,
    time_efficiency: i64,
    quantity: i64,
}

impl EsiBlueprint {
    fn into_original(self) -> Option<Blueprint> {
        (self.quantity == ORIGINAL_QUANTITY).then_some(Blueprint {
            item_id: self.item_id,
            type_id: self.type_id,
            location_id: self.location_id,
            me_level: self.material_efficiency,
            te_level: self.time_efficiency,
        })
    }
}

impl EsiHttpClient {
    /// Blueprint originals of a character
    pub async fn character_blueprints(
        &self,
        character_id: i64,
        access_token: &str,
    ) -> EsiResult<Fetched<Vec<Blueprint>>> {
        let url = self.url(&format!("/characters/{character_id}/blueprints"));
        self.fetch_blueprints(&url, access_token).await
    }

    /// Blueprint originals of a corporation
    pub async fn corporation_blueprints(
        &self,
        corporation_id: i64,
        access_token: &str,
    ) -> EsiResult<Fetched<Vec<Blueprint>>> {
        let url = self.url(&format!("/corporations/{corporation_id}/blueprints"));
        self.fetch_blueprints(&url, access_token).await
    }

    async fn fetch_blueprints(
        &self,
        url: &str,
        access_token: &str,
    ) -> EsiResult<Fetched<Vec<Blueprint>>> {
        let (raw, cache_until) =
            self.get_json::<Vec<EsiBlueprint>>(url, Some(access_token)).await?;
        let data = raw.into_iter().filter_map(EsiBlueprint::into_original).collect();
        Ok(Fetched { data, cache_until })
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::esi::client::parse_expires;
    use crate::esi::client::tests::{test_client, EXPIRES_HEADER};

    const MIXED: &str = r#"[
        {"item_id":1,"type_id":100,"location_id":60000004,"material_efficiency":10,"time_efficiency":20,"quantity":-1},
        {"item_id":2,"type_id":200,"location_id":60000004,"material_efficiency":0,"time_efficiency":0,"quantity":-2},
        {"item_id":3,"type_id":300,"location_id":60000004,"material_efficiency":0,"time_efficiency":0,"quantity":10}
    ]"#;

    #[tokio::test]
    async fn keeps_only_originals() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/characters/12345/blueprints"))
            .and(header("Authorization", "Bearer tok"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Expires", EXPIRES_HEADER)
                    .set_body_string(MIXED),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (client, _) = test_client(&server);
        let fetched = client.character_blueprints(12345, "tok").await.unwrap();

        assert_eq!(
            fetched.data,
            vec![Blueprint {
                item_id: 1,
                type_id: 100,
                location_id: 60_000_004,
                me_level: 10,
                te_level: 20
            }]
        );
        assert_eq!(fetched.cache_until, parse_expires(Some(EXPIRES_HEADER)));
    }

    #[tokio::test]
    async fn empty_list_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&server)
            .await;

        let (client, _) = test_client(&server);
        assert!(client.character_blueprints(1, "tok").await.unwrap().data.is_empty());
    }

    #[tokio::test]
    async fn corporation_endpoint_filters_copies() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/corporations/98000001/blueprints"))
            .respond_with(ResponseTemplate::new(200).set_body_string(MIXED))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _) = test_client(&server);
        let fetched = client.corporation_blueprints(98_000_001, "tok").await.unwrap();
        assert_eq!(fetched.data.len(), 1);
    }
}
