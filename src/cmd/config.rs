//! Configuration display command — `pricemap config`.

use pricemap::config::Config;

pub fn cmd_config(cfg: &Config) {
    println!();
    println!("Pricemap Configuration");
    println!("======================");
    println!();
    match &cfg.config_file {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: (none; built-in defaults)"),
    }
    println!();
    println!("[endpoints]");
    println!("  query_url = \"{}\"", cfg.query_url);
    println!("  polygon_url = \"{}\"", cfg.polygon_url);
    println!("  geocode_url = \"{}\"", cfg.geocode_url);
    println!();
    println!("[http]");
    println!("  timeout_secs = {}", cfg.timeout.as_secs());
    println!("  retries = {}", cfg.retries);
    println!();
    println!("[cache]");
    println!("  dir = \"{}\"", cfg.cache_dir.display());
    println!("  enabled = {}", cfg.use_cache);
}
