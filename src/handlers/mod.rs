//! Command handlers, one module per action.
//!
//! Each module follows the same convention:
//! - `ACTION` - the action this handler responds to
//! - `guard` - cheap presence check on the payload
//! - `handle` - the command handler
//!
//! ```ignore
//! // src/handlers/user_read.rs
//!
//! pub const ACTION: Action = Action::ReadUser;
//!
//! pub fn guard<S>(ctx: &Context<S>) -> bool {
//!     ctx.has_actor()
//! }
//!
//! pub fn handle<S: RecordStore>(ctx: &Context<S>) -> CommandResult {
//!     let user = ctx.store().get_user(ctx.actor())?;
//!     Ok(serde_json::to_value(user)?)
//! }
//! ```

pub mod trip_start;
pub mod trip_stop;
pub mod user_create;
pub mod user_delete;
pub mod user_read;
pub mod user_update;

/// Register handler modules with a dispatcher using the convention pattern.
///
/// Each handler module must export:
/// - `ACTION: Action` - the action it handles
/// - `guard(ctx) -> bool` - input validation
/// - `handle(ctx) -> CommandResult` - the handler
///
/// # Example
/// ```ignore
/// let dispatcher = fms_rust::register_handlers!(
///     Dispatcher::new(store, trips),
///     handlers::user_create,
///     handlers::user_read,
/// );
/// ```
#[macro_export]
macro_rules! register_handlers {
    ($dispatcher:expr, $( $($seg:ident)::+ ),+ $(,)?) => {
        $dispatcher
        $(
            .command_guarded(
                $($seg)::+::ACTION,
                $($seg)::+::guard,
                $($seg)::+::handle,
            )
        )+
    };
}
