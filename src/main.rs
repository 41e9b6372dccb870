use std::net::TcpListener;
use session_tokens::configuration::get_configuration;
use session_tokens::startup::{run, Application};
use session_tokens::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // 구조화된 로깅 초기화
    init_telemetry();

    tracing::info!("Starting application");

    // 설정 로드
    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error"
            ));
        }
    };

    // 저장소, 해시, 토큰 발급기 구성 (설정 검증 포함)
    let application = Application::build(&configuration).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "Startup error")
    })?;

    // 서버 주소 설정
    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    tracing::info!("Binding server to address: {}", address);

    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    // 서버 실행
    let server = run(listener, application)?;
    tracing::info!("Server started successfully");

    server.await
}
