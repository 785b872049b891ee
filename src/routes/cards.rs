use crate::{
    auth::AuthenticatedUser,
    context::AppContext,
    error::AppError,
    models::Card,
    serialize::CARD_VIEW,
    store,
};
use actix_web::{get, web, HttpResponse, Responder};

/// Lists every card on the board.
///
/// Requires a bearer token (the `/cards` scope is wrapped by `AuthMiddleware`).
/// Cards are ordered by priority, highest first, then by title.
///
/// ## Responses:
/// - `200 OK`: JSON array of cards.
/// - `401 Unauthorized`: missing, invalid or expired token.
/// - `500 Internal Server Error`: the store failed.
#[get("/")]
pub async fn get_cards(
    ctx: web::Data<AppContext>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let cards: Vec<Card> = store::fetch(ctx.store(), &Card::board_order()).await?;
    log::debug!("User {} listed {} card(s)", user.id(), cards.len());

    Ok(HttpResponse::Ok().json(CARD_VIEW.dump_many(&cards)))
}
