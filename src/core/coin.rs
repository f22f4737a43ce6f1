use rand::Rng;
use serde::Serialize;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Heads,
    Tails,
}

#[derive(Debug, Clone, Copy)]
pub struct Flip {
    pub side: Side,

    // opaque value in [0, 1000) for client animation timing, not a time
    pub animation_hint: u32,
}

pub fn flip<R: Rng + ?Sized>(rng: &mut R) -> Flip {
    let side = if rng.gen_bool(0.5) {
        Side::Heads
    } else {
        Side::Tails
    };

    Flip {
        side,
        animation_hint: rng.gen_range(0..1000),
    }
}
