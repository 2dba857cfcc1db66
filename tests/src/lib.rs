mod db_test;
pub use db_test::DbTest;

mod exec_log;
pub use exec_log::ExecLog;

mod logging_driver;
pub use logging_driver::{DriverOp, LoggingDriver};

pub use std_util::*;

use ecmap::schema::ec::{SchemaBuilder, Version};
use std::sync::Once;

/// Installs a `tracing` subscriber writing through the test harness. The
/// filter comes from `RUST_LOG`.
pub fn init_tracing() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A current-thread runtime for one test.
pub fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to create Tokio runtime")
}

/// `TestSchema` (alias `ts`) at `version`.
pub fn test_schema(version: (u32, u32, u32)) -> SchemaBuilder {
    ecmap::schema::ec::Schema::builder(
        "TestSchema",
        "ts",
        Version::new(version.0, version.1, version.2),
    )
}

#[macro_export]
macro_rules! tests {
    (
        $(
            $( #[$attrs:meta] )*
            $f:ident
        ),+
    ) => {
        #[cfg(feature = "sqlite")]
        mod sqlite {
            $(
                #[test]
                $( #[$attrs] )*
                fn $f() {
                    $crate::runtime().block_on(async {
                        let mut test = $crate::DbTest::new();
                        super::$f(&mut test).await;
                    });
                }
            )*
        }
    };
}
