use base64ct::{Base64, Encoding};
use serde_json::Value;

use super::{ChatMessage, ChatRequest, ContentPart, ImageUrl, MessageContent};

pub const ANALYZE_TEMPERATURE: f32 = 0.2;
pub const RECOMMEND_TEMPERATURE: f32 = 0.4;

pub const ANALYZE_SYSTEM_PROMPT: &str = r#"Você é um analisador nutricional.
Responda APENAS em JSON válido (sem markdown, sem texto fora do JSON).
Objetivo: estimar calorias, carboidratos (carbs_g) e proteínas (protein_g).
Se faltar informação, estime por porções médias e reduza confidence.
Não faça aconselhamento médico.

Schema obrigatório (JSON):
{
  "schema_version": "1.0",
  "meal": {
    "language": "<lang>",
    "items": [
      {
        "name": "string",
        "quantity": number,
        "unit": "string",
        "estimated_grams": number,
        "macros": { "calories": number, "carbs_g": number, "protein_g": number },
        "confidence": number
      }
    ],
    "totals": { "calories": number, "carbs_g": number, "protein_g": number },
    "notes": "string",
    "overall_confidence": number
  }
}"#;

pub const RECOMMEND_SYSTEM_PROMPT: &str = r#"Você é um coach nutricional (não médico).
Responda APENAS em JSON válido. Sem diagnóstico. Sem alarmismo.
Considere que dados são estimativas.

Schema obrigatório:
{
  "schema_version": "1.0",
  "recommendations": [
    {
      "title": "string",
      "why": "string",
      "actions": ["string", "string"]
    }
  ],
  "insights": {
    "avg_calories": number,
    "avg_carbs_g": number,
    "avg_protein_g": number
  },
  "warnings": ["string"]
}"#;

/// An uploaded meal photo.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: bytes::Bytes,
    pub mime: String,
}

impl ImageUpload {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, Base64::encode_string(&self.bytes))
    }
}

pub fn analysis_user_prompt(text: &str, lang: &str) -> String {
    format!(
        "Idioma de saída: {lang}\n\
         Descrição do usuário: {text}\n\
         \n\
         Regras:\n\
         - Use itens separados (items[]) quando houver múltiplos alimentos.\n\
         - Preencha totals somando items.\n\
         - confidence e overall_confidence devem ser de 0 a 1.\n\
         - Se houver bebida zero/sem calorias, estime adequadamente."
    )
}

pub fn analysis_request(text: &str, lang: &str, image: Option<&ImageUpload>) -> ChatRequest {
    let mut parts = vec![ContentPart::Text {
        text: analysis_user_prompt(text, lang),
    }];
    if let Some(image) = image {
        parts.push(ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: image.data_url(),
            },
        });
    }

    ChatRequest {
        messages: vec![
            ChatMessage::system(ANALYZE_SYSTEM_PROMPT),
            ChatMessage::user(MessageContent::Parts(parts)),
        ],
        temperature: ANALYZE_TEMPERATURE,
    }
}

pub fn recommendation_request(payload: &Value) -> ChatRequest {
    ChatRequest {
        messages: vec![
            ChatMessage::system(RECOMMEND_SYSTEM_PROMPT),
            ChatMessage::user(MessageContent::Text(payload.to_string())),
        ],
        temperature: RECOMMEND_TEMPERATURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_only_analysis_has_single_part() {
        let req = analysis_request("comi 2 ovos", "pt", None);
        assert_eq!(req.temperature, ANALYZE_TEMPERATURE);
        assert_eq!(req.messages.len(), 2);
        match &req.messages[1].content {
            MessageContent::Parts(parts) => {
                assert_eq!(parts.len(), 1);
                let ContentPart::Text { text } = &parts[0] else {
                    panic!("expected text part");
                };
                assert!(text.contains("Idioma de saída: pt"));
                assert!(text.contains("comi 2 ovos"));
            }
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[test]
    fn image_becomes_data_url_part() {
        let image = ImageUpload {
            bytes: bytes::Bytes::from_static(b"\x89PNG"),
            mime: "image/png".into(),
        };
        let req = analysis_request("", "en", Some(&image));
        let MessageContent::Parts(parts) = &req.messages[1].content else {
            panic!("expected parts");
        };
        assert_eq!(
            parts[1],
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: "data:image/png;base64,iVBORw==".into()
                }
            }
        );
    }

    #[test]
    fn parts_serialize_in_chat_completions_shape() {
        let part = ContentPart::ImageUrl {
            image_url: ImageUrl { url: "data:x".into() },
        };
        assert_eq!(
            serde_json::to_value(&part).unwrap(),
            json!({ "type": "image_url", "image_url": { "url": "data:x" } })
        );
    }

    #[test]
    fn recommendation_payload_is_sent_as_json_text() {
        let payload = json!({ "goals": { "protein_g": 120 }, "nota": "pão" });
        let req = recommendation_request(&payload);
        assert_eq!(req.temperature, RECOMMEND_TEMPERATURE);
        let MessageContent::Text(text) = &req.messages[1].content else {
            panic!("expected text");
        };
        let roundtrip: Value = serde_json::from_str(text).unwrap();
        assert_eq!(roundtrip, payload);
        assert!(text.contains("pão"));
    }
}
