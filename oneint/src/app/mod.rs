mod report;

use self::report::{report_geometry, report_summary};
use crate::io::{setup_output, write_matrices_json};
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use oneint::config::{Args, Config};
use oneint::{BasisRegistry, EngineOptions, IntegralContext};
use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

pub struct IntegralApplication {
    args: Args,
    config: Config,
}

impl IntegralApplication {
    pub fn from_cli() -> Result<Self> {
        let args = Args::parse();
        let config = load_config(&args)?;
        Ok(Self { args, config })
    }

    pub fn run(self) -> Result<()> {
        setup_output(self.args.output.as_ref());
        info!("Configuration loaded:\n{:?}", self.config);

        let registry = self.registry()?;
        info!("Basis data directory: {}", registry.data_dir().display());

        let molecule = self
            .config
            .molecule()
            .wrap_err("Invalid geometry in configuration")?;
        report_geometry(&molecule);

        let basis_name = self
            .args
            .basis
            .clone()
            .unwrap_or_else(|| self.config.basis_name().to_string());
        let ctx = IntegralContext::from_molecule(registry, molecule, &basis_name)
            .wrap_err_with(|| format!("Unable to set up basis '{}'", basis_name))?
            .with_options(self.engine_options());
        info!("\n{}", ctx);

        let start = Instant::now();
        let ints = ctx
            .one_body_integrals()
            .wrap_err("One-electron integral evaluation failed")?;
        info!(
            "One-electron integrals finished in {:.3} s",
            start.elapsed().as_secs_f64()
        );
        report_summary(&ctx, &ints);

        if let Some(path) = &self.args.matrices {
            write_matrices_json(path, ctx.basis_name(), &ints)?;
        }
        Ok(())
    }

    // Command line first, then the config file, then the environment. The
    // registry is resolved before any geometry work so a bad data path fails
    // the run immediately.
    fn registry(&self) -> Result<&'static Arc<BasisRegistry>> {
        let explicit = self
            .args
            .data_path
            .as_ref()
            .or(self.config.data_path.as_ref());
        match explicit {
            Some(dir) => {
                let registry = BasisRegistry::new(dir)
                    .wrap_err_with(|| format!("Unusable basis data directory: {}", dir))?;
                Ok(BasisRegistry::install_global(registry))
            }
            None => BasisRegistry::global().wrap_err("No basis data directory configured"),
        }
    }

    fn engine_options(&self) -> EngineOptions {
        let params = self.config.engine_params();
        let mut options = params.engine_options();
        if self.args.serial {
            info!("Overriding engine parallelism: serial");
            options.parallel = false;
        }
        if let Some(ms) = self.args.timeout_ms {
            info!("Overriding engine timeout with: {} ms", ms);
            options.deadline = Some(Instant::now() + Duration::from_millis(ms));
        }
        options
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let config_content = fs::read_to_string(&args.config_file)
        .wrap_err_with(|| format!("Unable to read configuration file: {}", args.config_file))?;

    let config = Config::from_yaml(&config_content).wrap_err("Failed to parse configuration file")?;

    Ok(config)
}
