use eframe::egui::Color32;

/// Display colours
#[derive(Clone, Copy)]
pub struct UiColors {
    pub panel: Color32,
    pub status: Color32,
    pub error: Color32,
}

/// Main UI configuration struct that holds all UI-related settings
#[derive(Clone, Copy)]
pub struct UiConfig {
    pub colors: UiColors,
    /// Key that closes every window
    pub quit_key: eframe::egui::Key,
    pub status_text_size: f32,
}

/// Global UI configuration instance
pub static UI_CONFIG: UiConfig = UiConfig {
    colors: UiColors {
        panel: Color32::BLACK,
        status: Color32::GRAY,
        error: Color32::from_rgb(246, 70, 93),
    },
    quit_key: eframe::egui::Key::Q,
    status_text_size: 18.0,
};
