//! Order creation step names.

/// Step name: synchronous reservation call.
pub const STEP_RESERVE_ITEMS: &str = "reserve_items";

/// Step name: "reserve items" queue message.
pub const STEP_NOTIFY_RESERVED_ITEMS: &str = "notify_reserved_items";
