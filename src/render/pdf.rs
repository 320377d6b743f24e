use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};
use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::constants;
use crate::models::chat::Conversation;
use crate::text;

pub fn transcript_file_name(conversation_id: &str) -> String {
    format!("Conversation {}.pdf", conversation_id)
}

const PAGE_WIDTH: f32 = 215.9;
const PAGE_HEIGHT: f32 = 279.4;
const MARGIN: f32 = 20.0;
const LINE_HEIGHT: f32 = 6.0;
const WRAP_COLUMNS: usize = 95;

struct Cursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
}

impl<'a> Cursor<'a> {
    fn write_line(&mut self, line: &str, size: f32, font: &IndirectFontRef) {
        if self.y < MARGIN {
            let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Capa 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT - MARGIN;
        }
        self.layer
            .use_text(line, size, Mm(MARGIN), Mm(self.y), font);
        self.y -= LINE_HEIGHT;
    }

    fn write_wrapped(&mut self, body: &str, size: f32, font: &IndirectFontRef) {
        for line in body.lines() {
            if line.is_empty() {
                self.y -= LINE_HEIGHT / 2.0;
                continue;
            }
            for chunk in wrap(line, WRAP_COLUMNS) {
                self.write_line(&chunk, size, font);
            }
        }
        self.y -= LINE_HEIGHT / 2.0;
    }
}

fn wrap(line: &str, columns: usize) -> Vec<String> {
    let mut wrapped = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        if !current.is_empty() && current.len() + word.len() + 1 > columns {
            wrapped.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        wrapped.push(current);
    }
    if wrapped.is_empty() {
        wrapped.push(String::new());
    }
    wrapped
}

/// Renders the full transcript: a title block with status, formatted date
/// and the requesting user, then one Consulta/Respuesta block per message.
/// Message text goes through the markdown step before layout.
pub fn write_transcript(
    conversation: &Conversation,
    user_id: &str,
    output: &Path,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let (doc, page, layer) = PdfDocument::new(
        "Detalle de la consulta",
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Capa 1",
    );
    let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

    let mut cursor = Cursor {
        doc: &doc,
        layer: doc.get_page(page).get_layer(layer),
        y: PAGE_HEIGHT - MARGIN,
    };

    cursor.write_line("Detalle de la consulta", 20.0, &bold);
    cursor.y -= LINE_HEIGHT;

    let status = if conversation.estado {
        constants::STATUS_ACTIVE
    } else {
        constants::STATUS_INACTIVE
    };
    cursor.write_line(&format!("Estado: {}", status), 12.0, &font);
    let date = conversation
        .date
        .map(text::format_display_date)
        .unwrap_or_default();
    cursor.write_line(&format!("Fecha: {}", date), 12.0, &font);
    cursor.write_line(&format!("Usuario: {}", user_id), 12.0, &font);
    cursor.y -= LINE_HEIGHT;

    for message in conversation.messages.as_deref().unwrap_or_default() {
        let heading = if message.id_persona.to_lowercase() == constants::ID_CHATBOT {
            "Respuesta:"
        } else {
            "Consulta:"
        };
        cursor.write_line(heading, 12.0, &bold);
        cursor.write_wrapped(&text::markdown_to_plain(&message.message), 12.0, &font);
    }

    doc.save(&mut BufWriter::new(File::create(output)?))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::ChatMessage;

    #[test]
    fn transcript_file_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut conversation = Conversation::new("c1", "Hola");
        conversation.estado = true;
        conversation.messages = Some(vec![
            ChatMessage {
                id_persona: "ana@test".into(),
                message: "¿Cómo **funciona**?".into(),
                fecha: None,
                uuid: "m1".into(),
                is_favorite: false,
                kind: "text".into(),
                documentos_url: None,
            },
            ChatMessage {
                id_persona: "Chatbot".into(),
                message: "Así.".into(),
                fecha: None,
                uuid: "m2".into(),
                is_favorite: false,
                kind: "text".into(),
                documentos_url: None,
            },
        ]);

        let path = dir.path().join(transcript_file_name("c1"));
        write_transcript(&conversation, "ana@test", &path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn long_lines_wrap() {
        let line = "palabra ".repeat(40);
        let chunks = wrap(line.trim(), 30);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.len() <= 30));
    }
}
