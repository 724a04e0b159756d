use std::time::Duration;

// Network
pub const DEFAULT_SWITCH_IP: &str = "192.168.1.100";
pub const DEFAULT_SWITCH_PORT: u16 = 6000;
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

// Time the device needs to register a click or a stick move
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(100);

// Stick bounds (symmetric, -32768 is not a valid position)
pub const STICK_MIN: i32 = -32767;
pub const STICK_MAX: i32 = 32767;

// Step keywords
pub mod keywords {
    pub const BUTTON: &str = "button";
    pub const HOLD: &str = "hold";
    pub const RELEASE: &str = "release";
    pub const WAIT: &str = "wait";
    pub const STICK: &str = "stick";
    pub const LEFT_STICK_PREFIX: char = '%';
    pub const RIGHT_STICK_PREFIX: char = '&';
}
