use crate::app::ports::SessionPort;
use crate::config::Endpoints;
use crate::error::{Result, SniperError};
use crate::types::ResellerListing;
use serde::Deserialize;
use tracing::instrument;

#[derive(Debug, Deserialize)]
struct ResellersResponse {
    data: Vec<ResellerEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResellerEntry {
    user_asset_id: u64,
    price: u64,
    seller: Seller,
}

#[derive(Debug, Deserialize)]
struct Seller {
    id: u64,
}

/// Cheapest resale listing of a limited asset, `None` when nobody sells it.
/// The endpoint returns listings sorted by price, so the first one wins.
#[instrument(skip(session, endpoints))]
pub async fn cheapest_reseller(
    session: &dyn SessionPort,
    endpoints: &Endpoints,
    asset_id: u64,
) -> Result<Option<ResellerListing>> {
    let url = endpoints.resellers_url(asset_id);
    let response = session.get(&url).await?;
    if !response.is_success() {
        return Err(SniperError::BadStatus {
            status: response.status,
            url,
        });
    }

    let resellers: ResellersResponse = response.json()?;
    Ok(resellers.data.into_iter().next().map(|entry| ResellerListing {
        user_asset_id: entry.user_asset_id,
        price: entry.price,
        seller_id: entry.seller.id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::scripted_session::ScriptedSession;
    use serde_json::json;

    fn endpoints() -> Endpoints {
        Endpoints::single_host("http://economy.test")
    }

    #[tokio::test]
    async fn test_first_listing_is_cheapest() {
        let session = ScriptedSession::new();
        session.respond_json(
            "/v1/assets/1365767/resellers",
            200,
            json!({"data": [
                {"userAssetId": 11, "seller": {"id": 5, "type": "User", "name": "a"}, "price": 300, "serialNumber": null},
                {"userAssetId": 12, "seller": {"id": 6, "type": "User", "name": "b"}, "price": 450, "serialNumber": 17}
            ]}),
        );

        let listing = cheapest_reseller(&session, &endpoints(), 1365767).await.unwrap();
        assert_eq!(listing, Some(ResellerListing { user_asset_id: 11, price: 300, seller_id: 5 }));
    }

    #[tokio::test]
    async fn test_no_resellers() {
        let session = ScriptedSession::new();
        session.respond_json("/resellers", 200, json!({"data": []}));
        assert_eq!(cheapest_reseller(&session, &endpoints(), 1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_bad_status_is_error() {
        let session = ScriptedSession::new();
        session.respond_json("/resellers", 400, json!({"errors": []}));
        assert!(matches!(
            cheapest_reseller(&session, &endpoints(), 1).await,
            Err(SniperError::BadStatus { status: 400, .. })
        ));
    }
}
