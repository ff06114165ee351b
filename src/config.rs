use std::sync::atomic::{AtomicU32, Ordering};

struct Config {
    quad_arena_cap_log2: AtomicU32,
}

static CONFIG: Config = Config {
    quad_arena_cap_log2: AtomicU32::new(20),
};

pub struct ConfigSnapshot {
    pub quad_arena_cap_log2: u32,
}

pub fn get_config() -> ConfigSnapshot {
    ConfigSnapshot {
        quad_arena_cap_log2: CONFIG.quad_arena_cap_log2.load(Ordering::Relaxed),
    }
}

/// Caps the number of quadtree nodes a freshly built arena may hold at
/// `2^cap_log2`. Arenas already constructed keep their cap.
pub fn set_quad_arena_cap_log2(cap_log2: u32) {
    CONFIG
        .quad_arena_cap_log2
        .store(cap_log2, Ordering::Relaxed);
}
