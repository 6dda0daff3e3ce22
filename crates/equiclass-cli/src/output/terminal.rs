//! Terminal output formatter

use equiclass_core::{ChatSessionRecord, ClassificationResponse, SearchHit};

const PREVIEW_CHARS: usize = 160;

pub fn format_classification(response: &ClassificationResponse) -> String {
    let mut output = String::new();
    output.push_str(&format!("Session: {}\n", response.session_id));
    output.push_str(&format!("Query:   {}\n", response.nlp_query));
    output.push_str(&format!("Filter:  {}\n", response.filter));
    output.push('\n');

    if response.results.is_empty() {
        output.push_str("No matching golf balls\n");
        return output;
    }

    for (rank, hit) in response.results.iter().enumerate() {
        output.push_str(&format_hit(rank + 1, hit));
    }
    output
}

fn format_hit(rank: usize, hit: &SearchHit) -> String {
    let field = |value: &Option<String>| value.as_deref().unwrap_or("-").to_string();

    let mut line = format!(
        "{:>2}. {:.2}  {} ({})\n",
        rank,
        hit.reranker_score.unwrap_or_default(),
        field(&hit.manufacturer),
        field(&hit.colour),
    );
    line.push_str(&format!("    pole: {}\n", field(&hit.pole_marking)));
    if hit.seam_marking.is_some() {
        line.push_str(&format!("    seam: {}\n", field(&hit.seam_marking)));
    }
    if let Some(lot) = &hit.usga_lot_num {
        line.push_str(&format!("    lot:  {}\n", lot));
    }
    line
}

pub fn format_history(session: &ChatSessionRecord) -> String {
    let mut output = format!(
        "Session {} (created {})\n",
        session.session_id, session.created_at
    );
    for message in &session.messages {
        output.push_str(&format!(
            "[{}] {:<9} {}\n",
            message.timestamp,
            message.sender,
            preview(&message.message_content)
        ));
    }
    output
}

fn preview(content: &str) -> String {
    let single_line = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= PREVIEW_CHARS {
        single_line
    } else {
        let cut: String = single_line.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", cut)
    }
}
