pub mod yolo_txt;
