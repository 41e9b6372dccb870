use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// 구조화된 로깅을 초기화합니다.
/// JSON 형식의 로그를 출력하며, RUST_LOG 환경 변수로 로그 레벨을 제어합니다.
/// `log` 크레이트로 남긴 로그(LoggerMiddleware)도 같은 구독자로 전달됩니다.
///
/// 이미 구독자가 설정되어 있으면 false를 반환합니다.
pub fn init_telemetry() -> bool {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let formatting_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .json();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(formatting_layer)
        .try_init()
        .is_ok()
}
