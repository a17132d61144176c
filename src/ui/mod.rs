// User interface components
pub mod capture_app;
pub mod config;
pub mod utils;
pub mod viewer_app;

// Re-export main apps
pub use capture_app::CaptureApp;
pub use config::UI_CONFIG;
pub use viewer_app::ViewerApp;
