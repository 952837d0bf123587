pub struct Icons;

impl Icons {
    pub const ADAPTER: &str = "🔌";
    pub const SOURCE: &str = "📂";
    pub const ENGINE: &str = "⚙️";
    pub const ROWS: &str = "🧾";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const DATABASE: &str = "🗄️";
}
