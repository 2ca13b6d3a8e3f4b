mod console;
mod resolve_trigger;

pub use console::{render_history, render_report};
pub use resolve_trigger::{ResolveEvent, ResolveTrigger};
