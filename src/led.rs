//! LED feedback controller (C8): turns the coordinator's per-tick
//! [`LedDescriptor`] into two driven RGB triples (mode LED, activity LED).
//!
//! The controller itself owns no knowledge of buttons, modes, or menu
//! navigation — it only reacts to the descriptor's fields, so it can be
//! unit-tested against hand-built descriptors without a `Coordinator`.

pub type Rgb = (u8, u8, u8);

const MODE_COLORS: [Rgb; 5] = [
    (0, 255, 0),   // gate
    (0, 128, 255), // trigger
    (255, 64, 0),  // toggle
    (255, 0, 255), // divide
    (255, 255, 0), // cycle
];

const WHITE: Rgb = (255, 255, 255);

/// Which mode owns each of the 8 menu pages; `None` for global pages,
/// which render white instead of a mode color.
const PAGE_MODE: [Option<u8>; 8] = [Some(0), Some(1), Some(1), Some(2), Some(3), Some(4), None, None];

#[derive(Clone, Copy, PartialEq, Eq)]
enum PageAnim {
    Blink,
    Glow,
}

/// First page of a mode-group blinks, the second (if any) glows; the two
/// global pages (6, 7) are treated as their own two-page group.
const PAGE_ANIMATION: [PageAnim; 8] = [
    PageAnim::Blink, // gate-A behavior
    PageAnim::Blink, // trigger edge
    PageAnim::Glow,  // trigger pulse length
    PageAnim::Blink, // toggle edge
    PageAnim::Blink, // divide divisor
    PageAnim::Blink, // cycle tempo
    PageAnim::Blink, // global CV option
    PageAnim::Glow,  // menu timeout
];

pub const DEFAULT_BLINK_PERIOD_MS: u32 = 500;
pub const DEFAULT_GLOW_PERIOD_MS: u32 = 1000;

fn page_color(page: u8) -> Rgb {
    match PAGE_MODE[page as usize % 8] {
        Some(mode) => MODE_COLORS[mode as usize % 5],
        None => WHITE,
    }
}

fn scale(color: Rgb, brightness: u8) -> Rgb {
    let b = brightness as u16;
    (
        ((color.0 as u16 * b) / 255) as u8,
        ((color.1 as u16 * b) / 255) as u8,
        ((color.2 as u16 * b) / 255) as u8,
    )
}

/// Triangle-wave brightness for an 8-bit phase: ramps 0..254 over
/// 0..127, then back down 254..0 over 128..255.
fn triangle_brightness(phase: u8) -> u8 {
    if phase <= 127 {
        (phase as u16 * 2) as u8
    } else {
        ((255 - phase as u16) * 2) as u8
    }
}

fn phase_for(elapsed_ms: u32, period_ms: u32) -> u8 {
    let period = period_ms.max(1) as u64;
    (((elapsed_ms as u64 % period) * 256) / period) as u8
}

/// Per-tick snapshot the coordinator hands to the LED controller.
#[derive(Clone, Copy)]
pub struct LedDescriptor {
    pub mode: u8,
    pub page: u8,
    pub in_menu: bool,
    /// Current value of the setting shown on `page`.
    pub setting_value: u8,
    /// Exclusive upper bound of that setting's value.
    pub setting_count: u8,
    pub activity_output: bool,
    /// 0..255 brightness for the activity LED in PERFORM (cycle mode's
    /// smooth ramp; everything else reports 0 or 255).
    pub activity_brightness: u8,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum AnimKind {
    Solid,
    Off,
    Blink,
    Glow,
}

#[derive(Clone, Copy)]
struct AnimState {
    kind: AnimKind,
    color: Rgb,
    period_ms: u32,
    seeded_at: u32,
}

impl AnimState {
    const fn solid(color: Rgb) -> Self {
        AnimState {
            kind: AnimKind::Solid,
            color,
            period_ms: 0,
            seeded_at: 0,
        }
    }

    fn render(&self, now: u32) -> Rgb {
        match self.kind {
            AnimKind::Solid => self.color,
            AnimKind::Off => (0, 0, 0),
            AnimKind::Blink => {
                let half = (self.period_ms / 2).max(1);
                let on = (now.wrapping_sub(self.seeded_at) / half) % 2 == 0;
                if on {
                    self.color
                } else {
                    (0, 0, 0)
                }
            }
            AnimKind::Glow => {
                let phase = phase_for(now.wrapping_sub(self.seeded_at), self.period_ms);
                scale(self.color, triangle_brightness(phase))
            }
        }
    }
}

pub struct LedController {
    mode_anim: AnimState,
    activity_anim: AnimState,
    was_in_menu: bool,
    last_page: u8,
    last_setting_value: u8,
}

impl LedController {
    pub const fn new() -> Self {
        LedController {
            mode_anim: AnimState::solid(MODE_COLORS[0]),
            activity_anim: AnimState::solid((0, 0, 0)),
            was_in_menu: false,
            last_page: 0,
            last_setting_value: 0,
        }
    }

    pub fn update(&mut self, desc: &LedDescriptor, now: u32) -> (Rgb, Rgb) {
        let entering_menu = desc.in_menu && !self.was_in_menu;
        let exiting_menu = !desc.in_menu && self.was_in_menu;
        let page_changed = desc.in_menu && desc.page != self.last_page;

        if entering_menu || page_changed {
            self.seed_mode_anim_for_page(desc.page, now);
            self.last_setting_value = u8::MAX; // force the activity anim to reseed below
        }
        if exiting_menu {
            self.mode_anim = AnimState::solid(MODE_COLORS[desc.mode as usize % 5]);
        }

        if desc.in_menu {
            if desc.setting_value != self.last_setting_value || entering_menu || page_changed {
                self.seed_activity_anim_for_setting(desc.page, desc.setting_value, now);
                self.last_setting_value = desc.setting_value;
            }
        } else {
            self.activity_anim = AnimState::solid((0, 0, 0));
        }

        self.was_in_menu = desc.in_menu;
        self.last_page = desc.page;

        let mode_rgb = self.mode_anim.render(now);
        let activity_rgb = if desc.in_menu {
            self.activity_anim.render(now)
        } else if desc.activity_output {
            scale(MODE_COLORS[desc.mode as usize % 5], desc.activity_brightness)
        } else {
            (0, 0, 0)
        };

        (mode_rgb, activity_rgb)
    }

    fn seed_mode_anim_for_page(&mut self, page: u8, now: u32) {
        let color = page_color(page);
        self.mode_anim = match PAGE_ANIMATION[page as usize % 8] {
            PageAnim::Blink => AnimState {
                kind: AnimKind::Blink,
                color,
                period_ms: DEFAULT_BLINK_PERIOD_MS,
                seeded_at: now,
            },
            PageAnim::Glow => AnimState {
                kind: AnimKind::Glow,
                color,
                period_ms: DEFAULT_GLOW_PERIOD_MS,
                seeded_at: now,
            },
        };
    }

    fn seed_activity_anim_for_setting(&mut self, page: u8, setting_value: u8, now: u32) {
        let color = page_color(page);
        self.activity_anim = match setting_value {
            0 => AnimState {
                kind: AnimKind::Off,
                color,
                period_ms: 0,
                seeded_at: now,
            },
            1 => AnimState::solid(color),
            2 => AnimState {
                kind: AnimKind::Blink,
                color,
                period_ms: DEFAULT_BLINK_PERIOD_MS,
                seeded_at: now,
            },
            _ => AnimState {
                kind: AnimKind::Glow,
                color,
                period_ms: DEFAULT_GLOW_PERIOD_MS,
                seeded_at: now,
            },
        };
    }
}

impl Default for LedController {
    fn default() -> Self {
        LedController::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(mode: u8, page: u8, in_menu: bool, value: u8, count: u8, activity: bool, brightness: u8) -> LedDescriptor {
        LedDescriptor {
            mode,
            page,
            in_menu,
            setting_value: value,
            setting_count: count,
            activity_output: activity,
            activity_brightness: brightness,
        }
    }

    #[test]
    fn perform_mode_shows_solid_mode_color() {
        let mut led = LedController::new();
        let (mode_rgb, _) = led.update(&desc(0, 0, false, 0, 5, false, 0), 0);
        assert_eq!(mode_rgb, (0, 255, 0));
        let (mode_rgb, _) = led.update(&desc(1, 0, false, 0, 4, false, 0), 100);
        assert_eq!(mode_rgb, (0, 128, 255));
    }

    #[test]
    fn activity_led_reflects_output_in_perform() {
        let mut led = LedController::new();
        let (_, activity) = led.update(&desc(0, 0, false, 0, 5, true, 255), 0);
        assert_eq!(activity, (0, 255, 0));
        let (_, activity) = led.update(&desc(0, 0, false, 0, 5, false, 0), 1);
        assert_eq!(activity, (0, 0, 0));
    }

    #[test]
    fn entering_menu_switches_mode_led_to_page_color() {
        let mut led = LedController::new();
        led.update(&desc(1, 0, false, 0, 5, false, 0), 0);
        let (mode_rgb, _) = led.update(&desc(1, 1, true, 0, 3, false, 0), 10);
        assert_eq!(mode_rgb, (0, 128, 255)); // trigger's color, page 1 belongs to trigger
    }

    #[test]
    fn exiting_menu_restores_solid_mode_color() {
        let mut led = LedController::new();
        led.update(&desc(2, 0, false, 0, 5, false, 0), 0);
        led.update(&desc(2, 3, true, 0, 2, false, 0), 10);
        let (mode_rgb, _) = led.update(&desc(2, 0, false, 0, 5, false, 0), 20);
        assert_eq!(mode_rgb, (255, 64, 0));
    }

    #[test]
    fn global_page_renders_white() {
        let mut led = LedController::new();
        led.update(&desc(0, 0, false, 0, 5, false, 0), 0);
        let (mode_rgb, _) = led.update(&desc(0, 6, true, 0, 2, false, 0), 10);
        assert_eq!(mode_rgb, (255, 255, 255));
    }

    #[test]
    fn setting_value_zero_turns_activity_led_off_in_menu() {
        let mut led = LedController::new();
        let (_, activity) = led.update(&desc(0, 0, true, 0, 5, false, 0), 0);
        assert_eq!(activity, (0, 0, 0));
    }

    #[test]
    fn setting_value_one_is_solid_page_color() {
        let mut led = LedController::new();
        let (_, activity) = led.update(&desc(0, 0, true, 1, 5, false, 0), 0);
        assert_eq!(activity, (0, 255, 0));
    }
}
