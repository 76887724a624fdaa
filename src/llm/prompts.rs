// file: src/llm/prompts.rs
// version: 1.0.0
// guid: e2f7a4c9-58b1-4d06-93ea-0c6b1d8f7425

//! Prompt templates

use crate::task::DecodedAttachment;

/// Prompt for a brand-new single-file web app
pub fn page_prompt(brief: &str, attachments: &[DecodedAttachment]) -> String {
    let mut prompt = String::from(
        "You are an experienced front-end developer. Build a complete single-page \
         web application delivered as ONE HTML file. Put all CSS in a <style> block \
         and all JavaScript in a <script> block; do not reference local files.\n\n",
    );

    prompt.push_str("## Brief\n");
    prompt.push_str(brief.trim());
    prompt.push_str("\n\n");

    if !attachments.is_empty() {
        prompt.push_str("## Attachments\n");
        prompt.push_str("The brief refers to these files. Use their contents where it asks you to.\n\n");
        for attachment in attachments {
            prompt.push_str(&format!(
                "### `{}`\n```\n{}\n```\n\n",
                attachment.name, attachment.content
            ));
        }
    }

    prompt.push_str(
        "## Output\nReply with the raw HTML document only, starting with <!DOCTYPE html>. \
         No explanations, no markdown.",
    );
    prompt
}

/// Prompt for revising an existing page
pub fn revision_prompt(existing_html: &str, brief: &str) -> String {
    format!(
        "You are an experienced front-end developer updating an existing single-page \
         web application.\n\n\
         ## Current index.html\n```html\n{}\n```\n\n\
         ## Requested change\n{}\n\n\
         ## Output\nReply with the complete updated HTML document only. Keep everything \
         the change does not touch. No explanations, no markdown.",
        existing_html,
        brief.trim()
    )
}

/// Prompt for the repository README
pub fn readme_prompt(brief: &str, repo_name: &str) -> String {
    format!(
        "You are a technical writer. Write a README.md for a web application.\n\n\
         Application name: `{}`\n\
         Brief: {}\n\n\
         Use these sections: Title, Summary, Usage, License (state that the project is \
         MIT licensed). Reply with the raw markdown only.",
        repo_name,
        brief.trim()
    )
}

/// README used when the model cannot produce one
pub fn fallback_readme(brief: &str, repo_name: &str) -> String {
    format!(
        "# {}\n\nThis project was generated based on the brief: {}",
        repo_name, brief
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_prompt_includes_attachments() {
        let attachments = vec![DecodedAttachment {
            name: "data.csv".to_string(),
            content: "a,b\n1,2".to_string(),
        }];

        let prompt = page_prompt("Chart the CSV", &attachments);

        assert!(prompt.contains("Chart the CSV"));
        assert!(prompt.contains("### `data.csv`"));
        assert!(prompt.contains("a,b\n1,2"));
    }

    #[test]
    fn test_page_prompt_without_attachments() {
        let prompt = page_prompt("Hello page", &[]);
        assert!(!prompt.contains("## Attachments"));
    }

    #[test]
    fn test_revision_prompt_embeds_current_code() {
        let prompt = revision_prompt("<html>old</html>", "Make it blue");
        assert!(prompt.contains("<html>old</html>"));
        assert!(prompt.contains("Make it blue"));
    }

    #[test]
    fn test_fallback_readme() {
        assert_eq!(
            fallback_readme("A quiz", "quiz-app"),
            "# quiz-app\n\nThis project was generated based on the brief: A quiz"
        );
    }
}
