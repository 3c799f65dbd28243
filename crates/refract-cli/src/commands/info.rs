//! `refract info`: Display version and environment.

pub fn execute() -> anyhow::Result<()> {
    println!("Refract v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Platform:     {} ({})", std::env::consts::OS, std::env::consts::ARCH);
    println!("Root type:    {}", refract_engine::RegistryConfig::default().root);
    println!("String type:  {}", refract_engine::STRING_TYPE);

    println!();
    println!("Environment:");
    print_env("  REFRACT_LOG", "REFRACT_LOG");
    print_env("  NO_COLOR", "NO_COLOR");
    Ok(())
}

fn print_env(label: &str, var: &str) {
    match std::env::var(var) {
        Ok(val) => println!("{} = {}", label, val),
        Err(_) => println!("{} = (default)", label),
    }
}
