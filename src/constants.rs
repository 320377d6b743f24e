//! Fixed message catalog returned inside result envelopes. Clients match on
//! these literals, so they must not change.

pub const MSJ_200: &str = "200 - OK";
pub const MSJ_204: &str = "204 - No Content";
pub const MSJ_404: &str = "404 - Not Found";

pub const CONV_UPDATE: &str = "Conversacion Actualizada";
pub const CONV_NO_UPDATE: &str = "Conversacion No Actualizada";
pub const MSJ_UPDATE: &str = "Mensajes de Conversacion Actualizados";
pub const MSJ_NO_UPDATE: &str = "Mensajes de Conversacion No Actualizados";
pub const MSJ_NO_EXIST: &str = "No se encontraron mensajes en la conversación.";
pub const MSJ_NO_EXIST_UPDATE: &str = "No se encontró el mensaje a actualizar.";
pub const CONV_DELETE: &str = "Conversacion Eliminada";
pub const CONV_NO_DELETE: &str = "Conversacion No Eliminada";
pub const CONV_NO_EXIST: &str = "La conversación no existe.";
pub const NO_FIELDS_TO_UPDATE: &str = "No hay campos para actualizar";
pub const PARAMS_REQUIRED: &str = "Los siguientes parametros son obligatorios:";
pub const DATE_FORMAT_INVALID: &str = "El formato de fecha no es válido.";

pub const BUCKET_NOT_CONFIGURED: &str =
    "El nombre del bucket no está configurado en la aplicación.";
pub const FILE_MISSING: &str = "No se proporcionó ningún archivo o el archivo está vacío.";
pub const FILE_TOO_LARGE: &str = "El archivo no puede exceder los 30 MB.";
pub const FILE_TYPE_NOT_ALLOWED: &str =
    "Solo se permiten archivos de Excel (.xlsx, .xls), PDF y Word (.docx, .doc).";

/// Sender id that marks a message as a bot reply (case-insensitive).
pub const ID_CHATBOT: &str = "chatbot";

pub const STATUS_ACTIVE: &str = "Activo";
pub const STATUS_INACTIVE: &str = "Inactivo";

/// Role allowed to browse conversations across users.
pub const ROLE_ADMIN: &str = "Administrador";
