//! Константы формата TXRM (page layout, reference image, type codes, metadata paths).

// -------- Files --------
pub const TXRM_EXT: &str = "txrm";
/// Suffix of the copy-on-write clone used by write sessions without overwrite.
pub const EDIT_SUFFIX: &str = "_edit";
pub const TMP_EXT: &str = "tmp";

// -------- Image pages --------
// ImageData{p}/Image{k}: p = ceil(k / 100), обе нумерации 1-based.
pub const IMAGES_PER_PAGE: usize = 100;
pub const PAGE_PREFIX: &str = "ImageData";
pub const IMAGE_PREFIX: &str = "Image";

// -------- Reference image --------
pub const REFERENCE_IMAGE_PATH: &str = "ReferenceData/Image";

// -------- Pixel type codes --------
pub const TYPE_CODE_U16: u32 = 5;
pub const TYPE_CODE_F32: u32 = 10;

// -------- Classifier --------
pub const DEFAULT_CONST_DEVIATION: f64 = 0.1;
/// Prefix of field names synthesized for promoted (varying) arrays.
pub const DYNAMIC_PREFIX: &str = "array_";

// -------- Angles --------
pub const ANGLES_PATH: &str = "ImageInfo/Angles";

// -------- Seeded const arrays (always carried, never classified) --------
pub const DTORA_DISTANCE_PATH: &str = "ImageInfo/DtoRADistance";
pub const STORA_DISTANCE_PATH: &str = "ImageInfo/StoRADistance";

// -------- Fixed-width text records ("big" arrays) --------
// Каждая запись 40 байт: текст + NUL-паддинг.
pub const RECORD_WIDTH: usize = 40;
pub const DATES_PATH: &str = "ImageInfo/Dates";
pub const MOTOR_POSITIONS_PATH: &str = "PositionInfo/MotorPositions";
pub const RAW_MOTOR_POSITIONS_PATH: &str = "PositionInfo/RawMotorPositions";
pub const IDEAL_MOTOR_POSITIONS_PATH: &str = "PositionInfo/MotorPositionsIdeal";
pub const AXIS_NAMES_PATH: &str = "PositionInfo/AxisNames";
pub const AXIS_UNITS_PATH: &str = "PositionInfo/AxisUnits";

// -------- Well-known field names --------
pub const F_IMAGE_WIDTH: &str = "image_width";
pub const F_IMAGE_HEIGHT: &str = "image_height";
pub const F_IMAGE_DATA_TYPE: &str = "image_data_type";
pub const F_NUMBER_OF_IMAGES: &str = "number_of_images";
pub const F_PIXEL_SIZE: &str = "pixel_size";
pub const F_REFERENCE_DATA_TYPE: &str = "reference_data_type";
pub const F_ANGLES: &str = "angles";
pub const F_X_SHIFTS: &str = "x_shifts";
pub const F_Y_SHIFTS: &str = "y_shifts";
