//! Per-question-type prompt data.
//!
//! Everything that differs between question types (instruction text, seed
//! exchanges, stop sentinel, temperature, token budget) lives in one static
//! table and feeds a single encode routine.

mod explain_code;
mod fix_code;
mod from_code;
mod general;
mod write_code;

use tutor_core::types::QuestionType;

/// A hardcoded example user/assistant pair that demonstrates the tag format.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeedExchange {
    pub user: &'static str,
    pub assistant: &'static str,
}

/// Prompt data for one mode (fresh or continuation) of one question type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeTemplate {
    /// Tag-format instruction appended to the system message.
    pub instruction: &'static str,
    pub seeds: &'static [SeedExchange],
    /// Sentinel the model is told to end with; sent as the stop sequence.
    pub stop: &'static str,
    pub temperature: f32,
}

/// Both modes of one question type plus its token budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuestionTemplate {
    pub question_type: QuestionType,
    pub fresh: ModeTemplate,
    pub continuation: ModeTemplate,
    pub max_tokens: u32,
}

/// Look up the template for a question type.
pub fn template_for(question_type: QuestionType) -> &'static QuestionTemplate {
    match question_type {
        QuestionType::GeneralQuestion => &general::TEMPLATE,
        QuestionType::QuestionFromCode => &from_code::TEMPLATE,
        QuestionType::CodeExplanation => &explain_code::TEMPLATE,
        QuestionType::HelpFixCode => &fix_code::TEMPLATE,
        QuestionType::HelpWriteCode => &write_code::TEMPLATE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags;

    #[test]
    fn test_every_type_has_its_own_template() {
        for qt in QuestionType::ALL {
            assert_eq!(template_for(qt).question_type, qt);
        }
    }

    #[test]
    fn test_sampling_table() {
        let expect = [
            (QuestionType::GeneralQuestion, 0.05, 0.15, 2048),
            (QuestionType::QuestionFromCode, 0.3, 0.15, 1024),
            (QuestionType::CodeExplanation, 0.1, 0.15, 1536),
            (QuestionType::HelpFixCode, 0.05, 0.15, 2048),
            (QuestionType::HelpWriteCode, 0.1, 0.1, 2048),
        ];
        for (qt, fresh, continuation, tokens) in expect {
            let t = template_for(qt);
            assert_eq!(t.fresh.temperature, fresh, "{qt} fresh");
            assert_eq!(t.continuation.temperature, continuation, "{qt} continuation");
            assert_eq!(t.max_tokens, tokens, "{qt} tokens");
        }
    }

    #[test]
    fn test_sentinels() {
        assert_eq!(
            template_for(QuestionType::GeneralQuestion).fresh.stop,
            tags::STOP_QUESTION_ANSWER
        );
        assert_eq!(
            template_for(QuestionType::QuestionFromCode).fresh.stop,
            tags::END_QUESTION_ANSWER
        );
        assert_eq!(
            template_for(QuestionType::QuestionFromCode).continuation.stop,
            tags::END_QUESTION_ANSWER
        );
        assert_eq!(
            template_for(QuestionType::CodeExplanation).fresh.stop,
            tags::STOP_EXPLAIN_CODE
        );
        assert_eq!(
            template_for(QuestionType::CodeExplanation).continuation.stop,
            tags::STOP_QUESTION_ANSWER
        );
        assert_eq!(
            template_for(QuestionType::HelpFixCode).fresh.stop,
            tags::STOP_FIXED_CODE
        );
        assert_eq!(
            template_for(QuestionType::HelpWriteCode).continuation.stop,
            tags::STOP_QUESTION_ANSWER
        );
    }

    #[test]
    fn test_instructions_name_their_sentinel() {
        for qt in QuestionType::ALL {
            let t = template_for(qt);
            for mode in [&t.fresh, &t.continuation] {
                assert!(
                    mode.instruction.contains(mode.stop),
                    "{qt} instruction does not mention {}",
                    mode.stop
                );
            }
        }
    }

    #[test]
    fn test_seed_counts() {
        for qt in QuestionType::ALL {
            let t = template_for(qt);
            for mode in [&t.fresh, &t.continuation] {
                assert!((1..=4).contains(&mode.seeds.len()), "{qt} seed count");
            }
        }
    }

    #[test]
    fn test_fix_code_seeds_use_fix_tags() {
        let t = template_for(QuestionType::HelpFixCode);
        for seed in t.fresh.seeds.iter().chain(t.continuation.seeds) {
            assert!(seed.user.contains(tags::INTENDED_BEHAVIOR));
            assert!(!seed.user.contains(tags::QUESTION));
            assert!(seed.assistant.contains(tags::FIXED_CODE));
        }
    }

    #[test]
    fn test_seed_answers_have_content() {
        for qt in QuestionType::ALL {
            let t = template_for(qt);
            for seed in t.fresh.seeds.iter().chain(t.continuation.seeds) {
                let parsed = crate::decoder::decode(seed.assistant);
                assert!(!parsed.content.is_empty(), "{qt} seed has no content");
            }
        }
    }
}
