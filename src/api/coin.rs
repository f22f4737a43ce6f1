use poem::{handler, web::Json};
use serde::Serialize;

use crate::core::coin::{self, Side};

#[derive(Serialize)]
pub struct CoinFlipResp {
    success: bool,
    result: Side,

    // animation hint only, see `coin::Flip`
    timestamp: u32,
}

#[handler]
pub fn flip() -> Json<CoinFlipResp> {
    let outcome = coin::flip(&mut rand::thread_rng());

    Json(CoinFlipResp {
        success: true,
        result: outcome.side,
        timestamp: outcome.animation_hint,
    })
}
