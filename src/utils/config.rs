use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub config_file: String,
    pub data_file: String,
    pub max_body_size: usize,
    pub cors_origins: Vec<String>,
    pub request_timeout_seconds: u64,
    pub telegram_bot_token: Option<String>,
    pub telegram_api_base: String,
    pub telegram_poll_timeout: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            config_file: "config.json".to_string(),
            data_file: "data.json".to_string(),
            max_body_size: 1024 * 1024, // 1MB
            cors_origins: vec!["*".to_string()],
            request_timeout_seconds: 30,
            telegram_bot_token: None,
            telegram_api_base: "https://api.telegram.org".to_string(),
            telegram_poll_timeout: 30,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = env::var("HOST") {
            config.host = host;
        }

        if let Ok(port) = env::var("PORT") {
            if let Ok(port_num) = port.parse::<u16>() {
                config.port = port_num;
            }
        }

        if let Ok(config_file) = env::var("CONFIG_FILE") {
            config.config_file = config_file;
        }

        if let Ok(data_file) = env::var("DATA_FILE") {
            config.data_file = data_file;
        }

        if let Ok(max_size) = env::var("MAX_BODY_SIZE") {
            if let Ok(size) = max_size.parse::<usize>() {
                config.max_body_size = size;
            }
        }

        if let Ok(origins) = env::var("CORS_ORIGINS") {
            config.cors_origins = origins.split(',').map(|s| s.trim().to_string()).collect();
        }

        if let Ok(timeout) = env::var("REQUEST_TIMEOUT_SECONDS") {
            if let Ok(timeout_num) = timeout.parse::<u64>() {
                config.request_timeout_seconds = timeout_num;
            }
        }

        if let Ok(token) = env::var("TELEGRAM_BOT_TOKEN") {
            if !token.trim().is_empty() {
                config.telegram_bot_token = Some(token.trim().to_string());
            }
        }

        if let Ok(api_base) = env::var("TELEGRAM_API_BASE") {
            config.telegram_api_base = api_base;
        }

        if let Ok(timeout) = env::var("TELEGRAM_POLL_TIMEOUT") {
            if let Ok(timeout_num) = timeout.parse::<u64>() {
                config.telegram_poll_timeout = timeout_num;
            }
        }

        config
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|origin| origin == "*")
    }
}
