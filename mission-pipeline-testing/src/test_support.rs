//! Score ranges used only to generate realistic-looking fixture data.
//! `narrow_score_range` is never referenced by production code (nothing in
//! `mission-pipeline` imports this crate outside `dev-dependencies`) -- the
//! name makes that boundary explicit so it is never mistaken for the
//! score range the pipeline itself accepts (`[0, 1000]`, validated in
//! `mission_pipeline::dal::event_store::validate_score`).

use rand::Rng;

/// A deliberately narrow `[350, 500]` band for tests that want a plausible
/// mid-range score without caring about the exact value.
pub fn narrow_score_range<R: Rng + ?Sized>(rng: &mut R) -> i32 {
    rng.gen_range(350..=500)
}
