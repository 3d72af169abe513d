//! Root crate facade for the pastebin server.

pub use pastebin_server::{
    changes, config, create_app, db, error, handlers, models, resolve_bind_address, run,
    serve_router, service, shutdown_signal, spawn_background_tasks, tasks, AppError, AppState,
    BackgroundTasks, Config, Services, Storage, StorageBackend, DEFAULT_PORT,
};
