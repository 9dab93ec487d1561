mod cli;
mod commands;
mod logging;
mod settings;

use anyhow::Context;
use clap::Parser;

use elmvm_backend::{ElmvmError, ErrorKind};
use elmvm_platform::{AppPaths, HOME_ENV};

use crate::cli::Cli;
use crate::commands::App;
use crate::settings::Settings;

fn main() {
    let cli = Cli::parse();

    let code = match try_main(cli) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            error
                .downcast_ref::<ElmvmError>()
                .map_or(ErrorKind::Unknown.exit_code(), ElmvmError::exit_code)
        }
    };

    std::process::exit(code);
}

fn try_main(cli: Cli) -> anyhow::Result<i32> {
    let base = AppPaths::new().context("could not determine elmvm directories")?;
    let settings = Settings::load(&base);
    let paths = settings.apply_storage_root(base, std::env::var_os(HOME_ENV).is_some());
    paths
        .ensure_dirs()
        .context("could not create elmvm directories")?;

    logging::init_logging(
        &paths.log_file(),
        settings.debug_logging,
        cli.verbose,
        settings.max_log_size_bytes,
    );
    log::debug!("Storage root: {}", paths.storage_root().display());

    let cwd = std::env::current_dir().context("could not read the working directory")?;
    let app = App::new(settings, paths, cwd)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("could not start the async runtime")?;

    Ok(runtime.block_on(app.run(cli.command))?)
}
