use crate::dataset::load_file;
use crate::error::Result;
use crate::models::DatasetKind;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    println!("Data dir:   {}", settings.data_dir);

    for kind in [DatasetKind::DailyStock, DatasetKind::ReceiveShip] {
        println!();
        println!("{} ({})", kind.name(), kind);
        let Some(path) = settings.dataset_path(kind) else {
            println!("  (not loaded) Run `stockview load <file> --kind ...` first.");
            continue;
        };
        println!("  File:       {}", path.display());
        match load_file(&path, kind) {
            Ok(loaded) => {
                let ds = loaded.dataset;
                let years: Vec<String> = ds.years().iter().map(|y| y.to_string()).collect();
                println!("  Rows:       {}", ds.len());
                println!("  Items:      {}", ds.item_codes().len());
                println!("  Years:      {}", years.join(", "));
                if let Some((first, last)) = ds.date_range() {
                    println!("  Dates:      {first} .. {last}");
                }
                if loaded.skipped > 0 {
                    println!("  Skipped:    {}", loaded.skipped);
                }
            }
            Err(e) => println!("  Unreadable: {e}"),
        }
    }

    Ok(())
}
