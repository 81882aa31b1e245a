//! Shop storefront: public info, availability verdict, manual toggle

use shared::availability::UnifiedStatus;
use shared::error::{AppError, ErrorCode};
use shared::models::{Shop, UserIdentity, UserRole};

use crate::error::ServiceResult;
use crate::live::{DomainEvent, EventDispatcher};
use crate::store::DataStore;

pub async fn get(store: &dyn DataStore, shop_id: i64) -> ServiceResult<Shop> {
    store
        .load_shop(shop_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ShopNotFound).into())
}

/// Current unified availability verdict, derived on demand
pub async fn status(store: &dyn DataStore, shop_id: i64) -> ServiceResult<UnifiedStatus> {
    let shop = get(store, shop_id).await?;
    Ok(shop.unified_status(super::local_now()))
}

/// Flip the manual availability switch, returning the fresh verdict
///
/// The stored flag only drives the verdict while the shop is in manual mode,
/// but it is persisted either way so switching modes picks it up. The caller
/// gets the same freshly computed verdict that watchers and the owner receive.
pub async fn toggle_online(
    store: &dyn DataStore,
    dispatcher: &EventDispatcher,
    actor: UserIdentity,
    shop_id: i64,
    is_online: bool,
) -> ServiceResult<UnifiedStatus> {
    let shop = get(store, shop_id).await?;
    if !(actor.is_admin() || (actor.role == UserRole::ShopOwner && shop.owner_id == actor.user_id))
    {
        return Err(AppError::forbidden("Not the owner of this shop").into());
    }

    let updated = store
        .set_shop_online(shop_id, is_online)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ShopNotFound))?;

    tracing::info!(shop_id, is_online, "Shop availability toggled");
    let now = super::local_now();
    let verdict = updated.unified_status(now);
    dispatcher
        .dispatch(DomainEvent::ShopStatusToggled { shop: updated, now })
        .await;

    Ok(verdict)
}
