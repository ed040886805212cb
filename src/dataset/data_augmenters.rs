pub mod flip_augmentations;
