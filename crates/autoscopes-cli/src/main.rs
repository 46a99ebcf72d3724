use autoscopes_cli::commands::register_builtin_commands;
use autoscopes_cli::{load_settings, CommandRegistry};
use autoscopes_core::logging::setup_logging;
use autoscopes_core::SETTINGS;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut registry = CommandRegistry::new();
    register_builtin_commands(&mut registry);

    let matches = registry.build_cli().get_matches();
    let settings = load_settings(&matches)?;
    setup_logging(&settings);
    SETTINGS.configure(settings.clone());

    registry.execute(&matches, &settings).await?;
    Ok(())
}
