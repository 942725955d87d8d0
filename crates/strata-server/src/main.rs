use strata_driver::Driver;
use strata_server::Server;
use strata_store::MemoryStore;

fn main() {
    tracing_subscriber::fmt::init();

    let addr = std::env::var("STRATA_ADDR").unwrap_or_else(|_| "0.0.0.0:9300".to_string());
    let backend = std::env::var("STRATA_BACKEND").unwrap_or_else(|_| "memory".to_string());

    match backend.as_str() {
        "memory" => {
            let driver = Driver::open(MemoryStore::new()).unwrap_or_else(|e| {
                eprintln!("failed to open memory backend: {e}");
                std::process::exit(1);
            });
            Server::new(driver, &addr).serve().expect("server failed");
        }
        #[cfg(feature = "rocksdb")]
        "rocksdb" => {
            let dir =
                std::env::var("STRATA_DATA_DIR").unwrap_or_else(|_| "./strata-data".to_string());
            let store = strata_store::RocksStore::open(std::path::Path::new(&dir))
                .unwrap_or_else(|e| {
                    eprintln!("failed to open rocksdb backend at {dir}: {e}");
                    std::process::exit(1);
                });
            let driver = Driver::open(store).unwrap_or_else(|e| {
                eprintln!("failed to open rocksdb backend: {e}");
                std::process::exit(1);
            });
            Server::new(driver, &addr).serve().expect("server failed");
        }
        other => {
            eprintln!("unsupported backend: {other}");
            std::process::exit(1);
        }
    }
}
