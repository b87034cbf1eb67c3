use finboard_core::payloads::ComplianceLevel;
use finboard_core::ToolPhase;
use finboard_core::UiTheme;
use ratatui::style::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiPalette {
    pub accent: Color,
    pub accent_alt: Color,
    pub success: Color,
    pub warning: Color,
    pub danger: Color,
    pub muted: Color,
    pub border: Color,
    pub panel_bg: Color,
    pub selected_bg: Color,
}

impl UiPalette {
    pub fn phase(self, phase: ToolPhase) -> Color {
        match phase {
            ToolPhase::Pending => self.muted,
            ToolPhase::Running => self.warning,
            ToolPhase::Complete => self.success,
        }
    }

    pub fn compliance(self, level: ComplianceLevel) -> Color {
        match level {
            ComplianceLevel::Compliant => self.success,
            ComplianceLevel::AtRisk => self.warning,
            ComplianceLevel::NonCompliant => self.danger,
        }
    }
}

pub fn palette_for(theme: UiTheme) -> UiPalette {
    match theme {
        UiTheme::Classic => UiPalette {
            accent: Color::Cyan,
            accent_alt: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
            muted: Color::DarkGray,
            border: Color::Gray,
            panel_bg: Color::Black,
            selected_bg: Color::DarkGray,
        },
        UiTheme::Cyberpunk => UiPalette {
            accent: Color::Magenta,
            accent_alt: Color::Cyan,
            success: Color::LightGreen,
            warning: Color::LightYellow,
            danger: Color::LightRed,
            muted: Color::Gray,
            border: Color::Magenta,
            panel_bg: Color::Black,
            selected_bg: Color::Rgb(58, 0, 58),
        },
        UiTheme::NeonNoir => UiPalette {
            accent: Color::LightBlue,
            accent_alt: Color::LightCyan,
            success: Color::LightGreen,
            warning: Color::Yellow,
            danger: Color::LightRed,
            muted: Color::Gray,
            border: Color::LightBlue,
            panel_bg: Color::Black,
            selected_bg: Color::Rgb(18, 28, 42),
        },
        UiTheme::SolarFlare => UiPalette {
            accent: Color::LightYellow,
            accent_alt: Color::LightRed,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
            muted: Color::Gray,
            border: Color::Yellow,
            panel_bg: Color::Black,
            selected_bg: Color::Rgb(42, 28, 0),
        },
        UiTheme::ForestZen => UiPalette {
            accent: Color::LightGreen,
            accent_alt: Color::Green,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
            muted: Color::Gray,
            border: Color::LightGreen,
            panel_bg: Color::Black,
            selected_bg: Color::Rgb(8, 32, 10),
        },
    }
}

pub fn syntect_theme_name(theme: UiTheme) -> &'static str {
    match theme {
        UiTheme::Classic => "base16-ocean.dark",
        UiTheme::Cyberpunk => "base16-eighties.dark",
        UiTheme::NeonNoir => "base16-mocha.dark",
        UiTheme::SolarFlare | UiTheme::ForestZen => "base16-ocean.dark",
    }
}
