use std::env;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process;

use era5_download::{
    CdsClient, ClientOptions, NominatimClient, NominatimOptions, RunFile, default_log_path,
    init_logging, prompt_product_selection, run,
};
use tracing::{error, info};

fn main() {
    let args: Vec<String> = env::args().collect();
    let Some(run_file) = args.get(1).map(PathBuf::from) else {
        eprintln!(
            "Usage:\n  era5-download <run.json>\n\nThe run file names the dataset, variables, years, months, hours, area and\nlooping flags. Credentials are read from CDSAPI_URL/CDSAPI_KEY or ~/.cdsapirc."
        );
        process::exit(2);
    };

    if let Err(e) = init_logging(&default_log_path()) {
        eprintln!("{e}");
        process::exit(1);
    }

    if let Err(e) = download(run_file) {
        error!("{e}");
        process::exit(1);
    }
}

fn download(path: PathBuf) -> era5_download::Result<()> {
    let mut file = RunFile::load(&path)?;
    let dataset = file.dataset_descriptor()?;
    info!("Run file: {}", path.display());

    // Monthly datasets without a product type selection ask for one on a terminal.
    if dataset.is_monthly() && file.product_types.is_none() && io::stdin().is_terminal() {
        let selection = prompt_product_selection(&dataset, io::stdin().lock(), io::stderr())?;
        file.product_types = Some(selection);
    }

    let geocoder = NominatimClient::new(NominatimOptions::default())?;
    let config = file.resolve(&geocoder)?;
    let client = CdsClient::new(ClientOptions::default())?;

    let summary = run(&config, &client)?;
    info!(
        "{} file(s) written in {}s",
        summary.files.len(),
        (summary.finished - summary.started).num_seconds()
    );
    Ok(())
}
