mod equality;
mod navigation;
