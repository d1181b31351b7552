//! Message templates.
//!
//! Messages are rendered as Telegram HTML. Every value coming from the explorer
//! is escaped before it is embedded.

use crate::models::{BlockDetail, ExplorerConfig};

/// Pool name shown when a block carries no attribution
const UNKNOWN_POOL: &str = "Unknown";

/// Escapes the characters that are significant in Telegram HTML
pub fn escape_html(text: &str) -> String {
	let mut escaped = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' => escaped.push_str("&quot;"),
			_ => escaped.push(c),
		}
	}
	escaped
}

/// Alert sent to subscribers when a pool block is detected
pub fn format_new_block_alert(detail: &BlockDetail, explorer: &ExplorerConfig) -> String {
	format!(
		"🚀 <b>New {} block!</b>\n\
		 <b>Height:</b> {}\n\
		 <b>Hash:</b> <code>{}</code>\n\
		 <b>Time:</b> {}\n\
		 <b>Transactions:</b> {}\n\
		 {}",
		escape_html(detail.pool_name().unwrap_or(UNKNOWN_POOL)),
		detail.height,
		escape_html(&detail.id),
		detail.formatted_time(),
		detail.tx_count_display(),
		block_link(detail, explorer),
	)
}

/// Reply to a block query answered from the cache
pub fn format_cached_block(detail: &BlockDetail, explorer: &ExplorerConfig) -> String {
	format!(
		"<b>Cached block info</b>\n\
		 <b>Height:</b> {}\n\
		 <b>Hash:</b> <code>{}</code>\n\
		 <b>Time:</b> {}\n\
		 <b>Pool:</b> {}\n\
		 <b>Transactions:</b> {}\n\
		 {}",
		detail.height,
		escape_html(&detail.id),
		detail.formatted_time(),
		escape_html(detail.pool_name().unwrap_or(UNKNOWN_POOL)),
		detail.tx_count_display(),
		block_link(detail, explorer),
	)
}

fn block_link(detail: &BlockDetail, explorer: &ExplorerConfig) -> String {
	format!(
		"🔗 <a href=\"{}/block/{}\">View on {}</a>",
		escape_html(&explorer.web_base),
		escape_html(&detail.id),
		escape_html(&explorer.name),
	)
}
