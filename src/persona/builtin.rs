//! Built-in persona definitions.

use super::{Persona, Personality, ResponseTable};

fn persona(
    id: &str,
    name: &str,
    title: &str,
    personality: Personality,
    responses: ResponseTable,
) -> Persona {
    Persona {
        id: id.to_string(),
        name: name.to_string(),
        title: title.to_string(),
        personality,
        responses,
    }
}

/// The four shipped personas.
pub(super) fn builtin_personas() -> Vec<Persona> {
    vec![
        persona(
            "sarah",
            "Sarah",
            "The Empathetic Listener",
            Personality::Empathetic,
            ResponseTable {
                greeting: "Hello! I'm Sarah, and I'm here to listen with an open heart. \
                           How are you feeling today?"
                    .to_string(),
                anxious: "I can sense that you're feeling anxious. That's completely normal \
                          and valid. Would you like to tell me more about what's on your mind? \
                          Sometimes just talking about our worries can help us feel a bit lighter."
                    .to_string(),
                sad: "I'm so sorry you're feeling sad. Your feelings matter, and it's okay \
                      to not be okay. What's been weighing on your heart lately?"
                    .to_string(),
                stressed: "Stress can feel overwhelming, and I want you to know that you're \
                           not alone in this. Let's take a moment to breathe together. What's \
                           causing you the most stress right now?"
                    .to_string(),
                default: "I hear you, and I want you to know that your feelings are valid. \
                          Would you like to explore this further together?"
                    .to_string(),
            },
        ),
        persona(
            "marcus",
            "Marcus",
            "The Motivational Coach",
            Personality::Motivational,
            ResponseTable {
                greeting: "Hey there! I'm Marcus, your personal cheerleader! What amazing \
                           things are we going to accomplish today?"
                    .to_string(),
                anxious: "Anxiety is just your mind's way of preparing for something \
                          important. You're stronger than you think! Let's channel that energy \
                          into something positive. What's one small step you can take right now?"
                    .to_string(),
                sad: "I know it feels tough right now, but remember: every storm passes. \
                      You've got incredible strength inside you. What's one thing that usually \
                      brings you joy? Let's focus on that."
                    .to_string(),
                stressed: "Stress is temporary, but your potential is limitless! Let's break \
                           this down into manageable pieces. What's the most important thing \
                           you need to tackle first?"
                    .to_string(),
                default: "You've got this! Every challenge is an opportunity to grow \
                          stronger. What's your next move?"
                    .to_string(),
            },
        ),
        persona(
            "luna",
            "Luna",
            "The Mindfulness Guide",
            Personality::Mindful,
            ResponseTable {
                greeting: "Welcome! I'm Luna. Let's take a moment to breathe and be present \
                           together. How are you feeling in this moment?"
                    .to_string(),
                anxious: "Anxiety is like waves in the ocean - they come and go. Let's \
                          practice some mindful breathing together. Take a deep breath in... \
                          and slowly release. What's happening in your body right now?"
                    .to_string(),
                sad: "Sadness is a natural part of being human, like clouds passing through \
                      the sky. Let's sit with these feelings without judgment. What do you \
                      notice about your emotions?"
                    .to_string(),
                stressed: "Stress often lives in our thoughts about the future. Let's bring \
                           our attention back to this present moment. What can you see, hear, \
                           or feel right now?"
                    .to_string(),
                default: "Let's pause and observe what's happening within you. There's \
                          wisdom in stillness."
                    .to_string(),
            },
        ),
        persona(
            "alex",
            "Alex",
            "The Practical Problem Solver",
            Personality::Practical,
            ResponseTable {
                greeting: "Hi! I'm Alex. I'm here to help you work through challenges and \
                           find practical solutions. What would you like to tackle today?"
                    .to_string(),
                anxious: "Anxiety often comes from uncertainty. Let's identify what's within \
                          your control and what isn't. What specific situation is causing you \
                          worry?"
                    .to_string(),
                sad: "When we're sad, it helps to understand the root cause. Let's explore \
                      what's behind these feelings. What changed recently that might be \
                      contributing to this?"
                    .to_string(),
                stressed: "Stress usually means we have too much on our plate. Let's \
                           prioritize and create a plan. What are the top three things you \
                           need to address?"
                    .to_string(),
                default: "Let's approach this systematically. What's the first step we can \
                          take to improve this situation?"
                    .to_string(),
            },
        ),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_four_builtin_personas() {
        assert_eq!(builtin_personas().len(), 4);
    }

    #[test]
    fn test_builtin_ids_are_unique() {
        let personas = builtin_personas();
        let mut ids: Vec<&str> = personas.iter().map(|p| p.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), personas.len());
    }

    #[test]
    fn test_builtin_personalities_are_distinct() {
        let personas = builtin_personas();
        let personalities: Vec<Personality> = personas.iter().map(|p| p.personality).collect();
        assert!(personalities.contains(&Personality::Empathetic));
        assert!(personalities.contains(&Personality::Motivational));
        assert!(personalities.contains(&Personality::Mindful));
        assert!(personalities.contains(&Personality::Practical));
    }
}
