/*!
 * Authenticated principal extractor
 *
 * Public API:
 * - Principal
 * - CurrentUser
 */

mod core;
mod types;

pub use core::CurrentUser;
pub use types::Principal;
