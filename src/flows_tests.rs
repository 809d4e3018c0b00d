use super::chat::{ChatReply, ChatRole};
use super::image::ImageInsights;
use super::translate::Translation;
use super::*;
use crate::lm::fake::{Reply, ScriptedClient};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;

fn rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

fn refinement_json() -> serde_json::Value {
    json!({
        "refinedIdea": "A marketplace matching retired engineers with hardware startups.",
        "associatedConcepts": ["fractional hiring", "mentorship"],
        "potentialPivots": ["corporate alumni networks"],
        "marketPotentialScore": "Score: 81",
        "swotSnippet": "S: deep expertise. W: cold start.",
        "competitorTeaser": "Generic freelance platforms dominate.",
        "viabilityFactorsChartData": [{ "name": "Market Demand", "score": 77 }]
    })
}

fn generation_message(err: &FlowError) -> &'static str {
    match err {
        FlowError::Generation { message, .. } => *message,
        other => panic!("expected generation failure, got {other:?}"),
    }
}

fn refine_idea(
    client: &ScriptedClient,
    input: &RefineIdeaInput,
    rng: &mut StdRng,
) -> Result<IdeaRefinement, FlowError> {
    Ok(run_flow(&mut RefineIdea::new(rng), client, input)?.output)
}

fn generate_guide(
    client: &ScriptedClient,
    input: &GenerateGuideInput,
) -> Result<DevelopmentGuide, FlowError> {
    Ok(run_flow(&mut GenerateGuide, client, input)?.output)
}

fn generate_proposal(
    client: &ScriptedClient,
    input: &GenerateProposalInput,
) -> Result<BusinessProposal, FlowError> {
    Ok(run_flow(&mut GenerateProposal, client, input)?.output)
}

fn analyze_safety(
    client: &ScriptedClient,
    input: &AnalyzeSafetyInput,
) -> Result<SafetyAnalysis, FlowError> {
    Ok(run_flow(&mut AnalyzeSafety, client, input)?.output)
}

fn analyze_image(
    client: &ScriptedClient,
    input: &AnalyzeImageInput,
) -> Result<ImageInsights, FlowError> {
    Ok(run_flow(&mut AnalyzeImage, client, input)?.output)
}

fn translate(client: &ScriptedClient, input: &TranslateInput) -> Result<Translation, FlowError> {
    Ok(run_flow(&mut Translate, client, input)?.output)
}

fn chat(client: &ScriptedClient, input: &ChatInput) -> Result<ChatReply, FlowError> {
    Ok(run_flow(&mut ChatFlow, client, input)?.output)
}

#[test]
fn refine_repairs_score_and_pads_chart() {
    let client = ScriptedClient::replying_json(refinement_json());
    let input = RefineIdeaInput {
        idea: "connect retired engineers with startups".to_string(),
    };
    let refinement = refine_idea(&client, &input, &mut rng()).expect("refine succeeds");
    assert_eq!(refinement.market_potential_score, 81);
    assert_eq!(refinement.viability_factors_chart_data.len(), 3);
    assert_eq!(refinement.viability_factors_chart_data[1].name, "Factor 2");

    let calls = client.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].prompt.contains("connect retired engineers with startups"));
    assert!(calls[0].output_schema.contains("viabilityFactorsChartData"));
}

#[test]
fn refine_fails_when_required_text_is_missing() {
    let mut response = refinement_json();
    response
        .as_object_mut()
        .expect("object")
        .remove("refinedIdea");
    let client = ScriptedClient::replying_json(response);
    let input = RefineIdeaInput {
        idea: "anything".to_string(),
    };
    let err = refine_idea(&client, &input, &mut rng()).unwrap_err();
    assert_eq!(err.to_string(), "AI failed to refine the idea.");
    assert!(err.detail().expect("detail").contains("refinedIdea"));
}

#[test]
fn blank_input_is_rejected_before_the_model_is_called() {
    let client = ScriptedClient::replying_json(refinement_json());
    let input = RefineIdeaInput {
        idea: "   ".to_string(),
    };
    let err = refine_idea(&client, &input, &mut rng()).unwrap_err();
    assert!(matches!(
        err,
        FlowError::Validation {
            flow: "refine-idea",
            ..
        }
    ));
    assert!(client.calls().is_empty());
}

#[test]
fn guide_prompt_omits_absent_optional_sections() {
    let client = ScriptedClient::replying_json(json!({ "guideMarkdown": "# Guide" }));
    let input = GenerateGuideInput {
        refined_idea: "Peer-to-peer tool library".to_string(),
        ..Default::default()
    };
    let guide = generate_guide(&client, &input).expect("guide succeeds");
    assert_eq!(guide.guide_markdown, "# Guide");

    let prompt = client.last_prompt();
    assert!(!prompt.contains("Tech Stack Preference"));
    assert!(!prompt.contains("Target Audience"));
    assert!(!prompt.contains("Associated Concepts"));
}

#[test]
fn guide_prompt_includes_present_optional_sections() {
    let client = ScriptedClient::replying_json(json!({ "guideMarkdown": "# Guide" }));
    let input = GenerateGuideInput {
        refined_idea: "Peer-to-peer tool library".to_string(),
        associated_concepts: vec!["sharing economy".to_string(), "IoT locks".to_string()],
        target_audience: Some("apartment dwellers".to_string()),
        tech_stack_suggestion: Some("Rust + SQLite".to_string()),
    };
    generate_guide(&client, &input).expect("guide succeeds");

    let prompt = client.last_prompt();
    assert!(prompt.contains("## Tech Stack Preference\nRust + SQLite"));
    assert!(prompt.contains("## Target Audience\napartment dwellers"));
    assert!(prompt.contains("- sharing economy\n- IoT locks"));
}

#[test]
fn guide_markdown_may_contain_code_fences() {
    let client = ScriptedClient::replying_json(json!({
        "guideMarkdown": "# Setup\n```bash\ncargo new app\n```\nDone."
    }));
    let input = GenerateGuideInput {
        refined_idea: "Peer-to-peer tool library".to_string(),
        ..Default::default()
    };
    let guide = generate_guide(&client, &input).expect("guide succeeds");
    assert_eq!(guide.guide_markdown, "# Setup\n```bash\ncargo new app\n```\nDone.");
}

#[test]
fn guide_with_blank_markdown_fails_hard() {
    let client = ScriptedClient::replying_json(json!({ "guideMarkdown": "  " }));
    let input = GenerateGuideInput {
        refined_idea: "x".to_string(),
        ..Default::default()
    };
    let err = generate_guide(&client, &input).unwrap_err();
    assert_eq!(
        generation_message(&err),
        "AI failed to generate the development guide markdown."
    );
}

#[test]
fn proposal_missing_pitch_deck_is_rejected() {
    let client =
        ScriptedClient::replying_json(json!({ "proposalMarkdown": "# Executive Summary" }));
    let input = GenerateProposalInput {
        refined_idea: "Subscription seed boxes".to_string(),
        ..Default::default()
    };
    let err = generate_proposal(&client, &input).unwrap_err();
    assert_eq!(
        err.to_string(),
        "AI failed to generate the business proposal or pitch deck outline markdown."
    );
}

#[test]
fn proposal_prompt_renders_optional_fields() {
    let client = ScriptedClient::replying_json(json!({
        "proposalMarkdown": "# Proposal",
        "pitchDeckOutlineMarkdown": "## Slide 1"
    }));
    let input = GenerateProposalInput {
        refined_idea: "Subscription seed boxes".to_string(),
        market_potential_score: Some(64),
        funding_goal: Some("$250k pre-seed".to_string()),
        ..Default::default()
    };
    let proposal = generate_proposal(&client, &input).expect("proposal succeeds");
    assert_eq!(proposal.pitch_deck_outline_markdown, "## Slide 1");

    let prompt = client.last_prompt();
    assert!(prompt.contains("## Market Potential Score\n64/100"));
    assert!(prompt.contains("## Funding Goal\n$250k pre-seed"));
    assert!(!prompt.contains("SWOT Summary"));
}

#[test]
fn proposal_rejects_out_of_range_score() {
    let client = ScriptedClient::default();
    let input = GenerateProposalInput {
        refined_idea: "x".to_string(),
        market_potential_score: Some(120),
        ..Default::default()
    };
    let err = generate_proposal(&client, &input).unwrap_err();
    assert!(matches!(err, FlowError::Validation { .. }));
    assert!(client.calls().is_empty());
}

#[test]
fn safety_declined_answer_is_a_generation_failure() {
    let client = ScriptedClient::declining();
    let input = AnalyzeSafetyInput {
        idea: "Drone delivery of groceries".to_string(),
    };
    let err = analyze_safety(&client, &input).unwrap_err();
    assert_eq!(
        err.to_string(),
        "AI failed to generate a safety analysis for the idea."
    );
    assert_eq!(err.detail(), Some("model returned no output"));
}

#[test]
fn safety_accepts_fenced_json() {
    let client = ScriptedClient::replying(
        "Here is my assessment:\n```json\n{\"potentialMisuse\": \"Surveillance\", \"safetyAndAlignmentRisks\": \"Crashes\", \"ethicalConsiderations\": \"Noise\"}\n```",
    );
    let input = AnalyzeSafetyInput {
        idea: "Drone delivery of groceries".to_string(),
    };
    let analysis = analyze_safety(&client, &input).expect("safety succeeds");
    assert_eq!(analysis.potential_misuse, "Surveillance");
}

#[test]
fn transport_errors_pass_through_unchanged() {
    let client = ScriptedClient::default();
    client.push(Reply::CommandFailed("rate limited".to_string()));
    let input = AnalyzeSafetyInput {
        idea: "x".to_string(),
    };
    let err = analyze_safety(&client, &input).unwrap_err();
    match err {
        FlowError::Transport(TransportError::CommandFailed { stderr, .. }) => {
            assert_eq!(stderr, "rate limited");
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[test]
fn image_flow_attaches_media_and_question() {
    let client = ScriptedClient::replying_json(json!({
        "uiUxAnalysis": "Clean layout",
        "brandAndMarketingAnalysis": "Playful",
        "featureIdentification": ["signup form"],
        "potentialImprovements": ["larger CTA", "contrast"]
    }));
    let input = AnalyzeImageInput {
        photo_data_uri: "data:image/png;base64,iVBORw0KGgo=".to_string(),
        user_question: Some("Is the signup obvious?".to_string()),
    };
    let insights = analyze_image(&client, &input).expect("image succeeds");
    assert_eq!(insights.potential_improvements, ["larger CTA", "contrast"]);

    let calls = client.calls();
    let media = calls[0].media.as_ref().expect("media attached");
    assert_eq!(media.mime_type, "image/png");
    assert!(calls[0]
        .prompt
        .contains("## User Question\nIs the signup obvious?"));
}

#[test]
fn image_flow_rejects_non_image_payloads() {
    let client = ScriptedClient::default();
    for uri in ["https://example.com/a.png", "data:text/plain;base64,aGk="] {
        let input = AnalyzeImageInput {
            photo_data_uri: uri.to_string(),
            user_question: None,
        };
        let err = analyze_image(&client, &input).unwrap_err();
        assert!(matches!(err, FlowError::Validation { .. }), "{uri}");
    }
    assert!(client.calls().is_empty());
}

#[test]
fn translate_returns_only_the_translation() {
    let client = ScriptedClient::replying_json(json!({ "translatedText": "\"Hola, mundo\"" }));
    let input = TranslateInput {
        text: "Hello, world".to_string(),
        target_language: "Spanish".to_string(),
    };
    let translation = translate(&client, &input).expect("translate succeeds");
    assert_eq!(translation.translated_text, "Hola, mundo");
    assert!(client.last_prompt().contains("into Spanish"));
}

#[test]
fn translate_without_output_uses_its_message() {
    let client = ScriptedClient::replying("I cannot translate that.");
    let input = TranslateInput {
        text: "Hello".to_string(),
        target_language: "French".to_string(),
    };
    let err = translate(&client, &input).unwrap_err();
    assert_eq!(err.to_string(), "Translation prompt did not return an output.");
}

fn chat_input(message: &str) -> ChatInput {
    ChatInput {
        message: message.to_string(),
        history: vec![
            ChatMessage {
                role: ChatRole::User,
                text: "How do I save an idea?".to_string(),
            },
            ChatMessage {
                role: ChatRole::Model,
                text: "Refine it, then save it.".to_string(),
            },
            ChatMessage {
                role: ChatRole::User,
                text: "How do I save an idea?".to_string(),
            },
        ],
        knowledge_base: vec![KnowledgeEntry {
            title: "Dashboard".to_string(),
            summary: "Stores saved ideas.".to_string(),
        }],
    }
}

#[test]
fn chat_answers_off_topic_questions_with_a_string() {
    let client = ScriptedClient::replying_json(json!({
        "aiResponse": "I can only help with Idea Incubator features, such as the Dashboard."
    }));
    let reply = chat(&client, &chat_input("What is the weather in Oslo?")).expect("chat succeeds");
    assert!(!reply.ai_response.trim().is_empty());

    let prompt = client.last_prompt();
    assert!(prompt.contains("- **Dashboard**: Stores saved ideas."));
    assert!(prompt.contains("What is the weather in Oslo?"));
}

#[test]
fn chat_history_keeps_order_and_duplicates() {
    let client = ScriptedClient::replying_json(json!({ "aiResponse": "ok" }));
    chat(&client, &chat_input("thanks")).expect("chat succeeds");
    let prompt = client.last_prompt();
    assert!(prompt.contains(
        "User: How do I save an idea?\nAssistant: Refine it, then save it.\nUser: How do I save an idea?"
    ));
}

#[test]
fn chat_without_reply_fails() {
    let client = ScriptedClient::replying_json(json!({ "answer": "wrong field" }));
    let err = chat(&client, &chat_input("hi")).unwrap_err();
    assert_eq!(
        err.to_string(),
        "AI failed to generate a response for the chatbot."
    );
}

#[test]
fn chat_requires_a_knowledge_base() {
    let client = ScriptedClient::default();
    let mut input = chat_input("hi");
    input.knowledge_base.clear();
    assert!(matches!(
        chat(&client, &input),
        Err(FlowError::Validation { .. })
    ));
}

#[test]
fn flow_kinds_parse_by_name() {
    for kind in FlowKind::ALL {
        assert_eq!(kind.name().parse::<FlowKind>(), Ok(kind));
    }
    let err = "summarize".parse::<FlowKind>().unwrap_err();
    assert!(err.contains("refine-idea"));
}

#[test]
fn run_named_dispatches_json_records() {
    let client = ScriptedClient::replying_json(json!({ "translatedText": "Hallo" }));
    let run = run_named(
        FlowKind::Translate,
        json!({ "text": "Hello", "targetLanguage": "German" }),
        &client,
        &mut rng(),
    )
    .expect("run succeeds");
    assert_eq!(run.output, json!({ "translatedText": "Hallo" }));
    assert!(run.prompt.contains("into German"));
    assert_eq!(run.raw_response, r#"{"translatedText":"Hallo"}"#);
}

#[test]
fn run_named_normalizes_refinements() {
    let client = ScriptedClient::replying_json(refinement_json());
    let run = run_named(
        FlowKind::RefineIdea,
        json!({ "idea": "retired engineers" }),
        &client,
        &mut rng(),
    )
    .expect("run succeeds");
    assert_eq!(run.output["marketPotentialScore"], 81);
    assert_eq!(
        run.output["viabilityFactorsChartData"]
            .as_array()
            .expect("chart array")
            .len(),
        3
    );
}

#[test]
fn run_named_rejects_mismatched_records() {
    let client = ScriptedClient::default();
    let err = run_named(
        FlowKind::Chat,
        json!({ "idea": "not a chat input" }),
        &client,
        &mut rng(),
    )
    .unwrap_err();
    assert!(matches!(err, FlowError::Validation { flow: "chat", .. }));
    assert!(client.calls().is_empty());
}
