use std::io::{self, BufRead, Write};

use crate::types::{RunRecord, TaskSet};

/// Numbered task list per role, in roster order.
pub fn format_task_distribution(tasks: &TaskSet) -> String {
    let mut out = String::from("Task Distribution:\n");
    for (role, list) in tasks.iter() {
        out.push_str(&format!("\n{}:\n", role));
        if list.is_empty() {
            out.push_str("  (no tasks)\n");
        }
        for (i, task) in list.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, task));
        }
    }
    out
}

pub fn format_agent_details(record: &RunRecord) -> String {
    let mut out = String::from("Agent Details:\n");
    for (role, agent) in record.agents.iter() {
        out.push_str(&format!(
            "\n{} ({})\n  Goal: {}\n  Backstory: {}\n  Tools: {}\n  Assigned tasks: {}\n",
            role,
            agent.name,
            agent.goal,
            agent.backstory,
            agent.tools.join(", "),
            agent.assigned_task_count
        ));
    }
    out
}

/// Asks until the answer is yes or no. End of input counts as no.
pub fn confirm<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> io::Result<bool> {
    loop {
        write!(output, "{} (yes/no): ", prompt)?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(false);
        }
        match line.trim().to_lowercase().as_str() {
            "yes" | "y" => return Ok(true),
            "no" | "n" => return Ok(false),
            _ => writeln!(output, "Please answer 'yes' or 'no'.")?,
        }
    }
}
