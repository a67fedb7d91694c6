use scoreloop_evidence::EvidenceSummary;

/// How many improvement suggestions are carried into the next prompt
const PROMPT_IMPROVEMENTS: usize = 3;

/// What the next prompt needs to know about the iteration before it
#[derive(Clone, Copy)]
pub struct PreviousIteration<'a> {
    pub score: f64,
    pub improvements: &'a [String],
    pub evidence: &'a EvidenceSummary,
}

/// Prompt templates for loop iterations
pub struct IterationPrompts;

impl IterationPrompts {
    /// Build the prompt for `iteration` (zero-based).
    ///
    /// The first iteration gets the task verbatim. Later iterations append
    /// the previous score, its top improvements and a test status line.
    pub fn build_iteration_prompt(
        task: &str,
        iteration: usize,
        previous: Option<PreviousIteration<'_>>,
    ) -> String {
        let mut prompt = task.to_string();

        let Some(last) = previous.filter(|_| iteration > 0) else {
            return prompt;
        };

        prompt.push_str("\n\n---\n");
        prompt.push_str(&format!(
            "This is iteration {}. Previous iteration scored {:.1}/100.\n",
            iteration + 1,
            last.score
        ));

        if !last.improvements.is_empty() {
            prompt.push_str("\nPrioritize these improvements:\n");
            for (i, improvement) in last.improvements.iter().take(PROMPT_IMPROVEMENTS).enumerate() {
                prompt.push_str(&format!("{}. {}\n", i + 1, improvement));
            }
        }

        if last.evidence.tests_run {
            prompt.push_str(&format!(
                "\nTest status: {} passed, {} failed\n",
                last.evidence.tests_passed, last.evidence.tests_failed
            ));
        }

        prompt
    }
}
